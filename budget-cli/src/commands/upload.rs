//! Upload command - CSV files stored locally for later import

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use dialoguer::Confirm;

use super::{get_context, read_csv_input};
use crate::output;

#[derive(Subcommand)]
pub enum UploadCommands {
    /// Store a CSV file
    Save {
        /// Path to CSV file (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Name to store it under (default: the file name)
        #[arg(long)]
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored uploads, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stored CSV
    Show {
        /// Upload key
        key: String,
    },
    /// Delete a stored upload
    Delete {
        /// Upload key
        key: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub fn run(command: UploadCommands) -> Result<()> {
    let ctx = get_context()?;
    let uploads = &ctx.upload_service;

    match command {
        UploadCommands::Save { file, name, json } => {
            let (text, filename) = read_csv_input(file.as_deref())?;
            let info = uploads.save(name.as_deref().unwrap_or(&filename), &text)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::success(&format!("Stored {} ({} chars)", info.filename, info.size_chars));
                println!("Key: {}", info.key);
                println!("Import it with: budget import commit --upload {}", info.key);
            }
        }
        UploadCommands::List { json } => {
            let list = uploads.list()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
                return Ok(());
            }

            if list.is_empty() {
                println!("No stored uploads.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Key", "File", "Stored", "Size"]);
            for info in list {
                table.add_row(vec![
                    info.key,
                    info.filename,
                    info.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    format!("{} chars", info.size_chars),
                ]);
            }
            println!("{}", table);
        }
        UploadCommands::Show { key } => {
            let upload = uploads.get(&key)?;
            print!("{}", upload.text);
        }
        UploadCommands::Delete { key, force } => {
            let upload = uploads.get(&key)?;
            if !force
                && !Confirm::new()
                    .with_prompt(format!("Delete stored upload '{}'?", upload.filename))
                    .default(false)
                    .interact()?
            {
                println!("Cancelled.");
                return Ok(());
            }
            uploads.delete(&upload.key)?;
            output::success(&format!("Deleted {}", upload.filename));
        }
    }

    Ok(())
}
