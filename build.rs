extern crate vergen;

use vergen::{vergen, OutputFns};

fn main() {
    vergen(OutputFns::all()).expect("Unable to generate the cargo build-time keys.");
}
