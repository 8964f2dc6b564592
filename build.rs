//! Build script for the expense gateway.
//!
//! Copies the configuration template and the sample destination files to the
//! user's local data directory, so an installed binary finds them where it
//! looks by default:
//!
//! - Linux: `~/.local/share/expgate/`
//! - macOS: `~/Library/Application Support/expgate/`
//! - Windows: `%LOCALAPPDATA%/expgate/`
//!
//! Missing templates only produce a cargo warning. Existing destination files
//! are never overwritten since they hold real credentials.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");
    println!("cargo:rerun-if-changed=destinations");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");
    let destinations_src = manifest_dir.join("destinations");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("expgate");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    if destinations_src.is_dir() {
        let destinations_out = out_dir.join("destinations");
        fs::create_dir_all(&destinations_out)?;
        for entry in fs::read_dir(&destinations_src)? {
            let entry = entry?;
            let target = destinations_out.join(entry.file_name());
            if entry.file_type()?.is_file() && !target.exists() {
                fs::copy(entry.path(), target)?;
            }
        }
    }

    Ok(())
}
