//! Error types for the PIC core.
//!
//! The taxonomy is narrow by design: a numerical kernel either has a sane
//! configuration or it doesn't, and a snapshot stream either parses or it
//! doesn't. Domain-arithmetic failures (e.g. a particle pushed past `c`)
//! are the caller's precondition violation and are not represented here.

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Bincode(::bincode::Error);
        Toml(::toml::de::Error);
        Json(::serde_json::Error);
    }

    errors {
        /// Invalid dimension, non-positive cell count/size, unknown
        /// boundary policy, or an empty species list.
        Configuration(msg: String) {
            description("invalid simulation configuration")
            display("invalid configuration: {}", msg)
        }

        /// A truncated or malformed snapshot stream, naming the field
        /// being parsed when it failed.
        Snapshot(field: String) {
            description("malformed snapshot stream")
            display("malformed snapshot: failed while reading '{}'", field)
        }
    }
}
