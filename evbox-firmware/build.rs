//! Build script for evbox-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates evbox.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const SECTIONS: [&str; 5] = ["uart", "flow_control", "sensors", "setpoint", "timing"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Reject a broken evbox.toml before it is embedded in the image
fn validate_config() {
    println!("cargo:rerun-if-changed=evbox.toml");

    let config_path = Path::new("evbox.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read evbox.toml", &[e.to_string()]),
    };

    // Syntax first, so errors point at a line
    let value: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in evbox.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    if let toml::Value::Table(root) = &value {
        for (key, entry) in root {
            match entry {
                toml::Value::Table(_) if !SECTIONS.contains(&key.as_str()) => {
                    errors.push(format!("unknown section [{}]", key));
                }
                toml::Value::Table(_) => {}
                _ if key != "name" => errors.push(format!("unknown top-level key '{}'", key)),
                _ => {}
            }
        }
    }
    if value.get("uart").is_none() {
        errors.push("missing [uart] section".to_string());
    }
    if !errors.is_empty() {
        fail("Invalid evbox.toml", &errors);
    }

    // Then the exact parser and checks the firmware runs at start-up
    let config = match evbox_core::config::parse_config(&content) {
        Ok(config) => config,
        Err(e) => fail("evbox.toml rejected by the parser", &[format!("{:?}", e)]),
    };
    if let Err(e) = config.validate() {
        fail("evbox.toml failed validation", &[format!("{:?}", e)]);
    }

    println!("cargo:warning=evbox.toml validated successfully");
}

fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| format!("  • {}", line))
        .collect::<Vec<_>>()
        .join("\n");
    panic!("\nERROR: {}\n{}\n", title, body);
}
