//! Converts a TOML document to every output format.
//!
//! Run with: cargo run --example convert

use remarshal::{convert, ConvertOptions, Format};
use std::error::Error;

const SOURCE: &str = r#"
title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[database]
ports = [8000, 8001, 8002]
enabled = true
"#;

fn main() -> Result<(), Box<dyn Error>> {
    for output in Format::OUTPUTS {
        let options = ConvertOptions::new(Format::Toml, output)
            .with_indent(2)
            .with_stringify(true);
        let bytes = convert(SOURCE.as_bytes(), &options)?;

        if output.is_binary() {
            println!("{}: {} bytes\n", output, bytes.len());
        } else {
            println!("{}:\n{}", output, String::from_utf8(bytes)?);
        }
    }

    // Dates have no JSON form, so this one needs stringify.
    let strict = ConvertOptions::new(Format::Toml, Format::Json);
    if let Err(e) = convert(SOURCE.as_bytes(), &strict) {
        println!("without stringify: {}", e);
    }

    Ok(())
}
