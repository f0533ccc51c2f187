//! Build script for the portal-client crate.
//!
//! This script loads environment variables at compile time, making them available
//! to the `option_env!()` macro in the source code.
//!
//! Priority order:
//! 1. Environment variables already set (e.g., from CI/CD, system env)
//! 2. Variables from `.env` file (if it exists)
//! 3. Variables from `.env.example` file (fallback for CI builds)

use std::env;
use std::fs;
use std::path::PathBuf;

const CONFIG_VARS: [&str; 1] = ["PORTAL_API_URL"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-changed=.env.example");
    for var in CONFIG_VARS {
        println!("cargo:rerun-if-env-changed={}", var);
    }

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let manifest_dir = PathBuf::from(manifest_dir);
    let env_file = manifest_dir.join(".env");
    let env_example_file = manifest_dir.join(".env.example");

    let env_vars_set = CONFIG_VARS
        .iter()
        .filter(|&var| env::var(var).is_ok())
        .count();

    let file_to_load = if env_file.exists() {
        Some(env_file)
    } else if env_vars_set == 0 && env_example_file.exists() {
        Some(env_example_file)
    } else {
        None
    };

    let Some(file_path) = file_to_load else {
        return;
    };

    let Ok(contents) = fs::read_to_string(&file_path) else {
        println!(
            "cargo:warning=Could not read {}, skipping compile-time configuration",
            file_path.display()
        );
        return;
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            // Only known keys, and never override the real environment
            if CONFIG_VARS.contains(&key) && env::var(key).is_err() {
                println!("cargo:rustc-env={}={}", key, value);
            }
        }
    }
}
