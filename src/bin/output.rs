pub mod path;

pub use self::path::OutputPath;
