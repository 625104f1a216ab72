//! Error chain for the `picsim` binary: wraps `relapic`'s own
//! [`relapic::errors::Error`] as a link and adds the binary's own foreign
//! links (TOML parsing, file I/O), widened with a `links` entry since this
//! binary drives a separate library crate rather than being the whole
//! program.

error_chain! {
    links {
        Core(relapic::errors::Error, relapic::errors::ErrorKind);
    }

    foreign_links {
        Io(::std::io::Error);
        Toml(::toml::de::Error);
    }
}
