//! Import command - import transactions from CSV

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use uuid::Uuid;

use super::{get_context, read_csv_input};
use crate::output;
use budget_core::services::import::{parse_csv, suggest_mapping, CommitOptions, CsvField, CsvMapping};
use budget_core::BudgetContext;

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Show headers, sample rows and the suggested column mapping
    Preview {
        /// Path to CSV file (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import every row of a CSV
    Commit(CommitArgs),
    /// List import jobs
    Jobs {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the row errors of an import job
    Errors {
        /// Import job ID
        job_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List or delete saved import profiles
    Profiles {
        /// Delete the named profile
        #[arg(long)]
        delete: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Source, mapping and output options for `import commit`
#[derive(Args)]
pub struct CommitArgs {
    /// Path to CSV file (reads stdin when omitted)
    file: Option<PathBuf>,
    /// Import a stored upload instead of a file
    #[arg(long, conflicts_with = "file")]
    upload: Option<String>,
    /// Use saved import profile
    #[arg(long)]
    profile: Option<String>,
    /// Map a field to a header, e.g. --map amount=Debit (repeatable)
    #[arg(long = "map", value_name = "FIELD=HEADER")]
    mappings: Vec<String>,
    /// Currency code for rows without one
    #[arg(long)]
    currency: Option<String>,
    /// Save the mapping used as a profile
    #[arg(long)]
    save_profile: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(command: ImportCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        ImportCommands::Preview { file, json } => preview(&ctx, file, json),
        ImportCommands::Commit(args) => commit(&ctx, args),
        ImportCommands::Jobs { json } => jobs(&ctx, json),
        ImportCommands::Errors { job_id, json } => errors(&ctx, &job_id, json),
        ImportCommands::Profiles { delete, json } => profiles(&ctx, delete, json),
    }
}

fn preview(ctx: &BudgetContext, file: Option<PathBuf>, json: bool) -> Result<()> {
    let (text, _) = read_csv_input(file.as_deref())?;
    let preview = ctx.import_service.preview(&text)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!("{} rows, {} columns", preview.row_count, preview.headers.len());
    println!();

    let mut table = output::create_table();
    table.set_header(preview.headers.clone());
    for row in &preview.sample_rows {
        table.add_row(
            preview
                .headers
                .iter()
                .map(|h| row.get(h).cloned().unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    println!("{}", table);
    println!();

    print_mapping("Suggested mapping:", &preview.suggested_mapping);
    if let Some(field) = preview.suggested_mapping.missing_required() {
        output::warning(&format!("No column found for {}. Use --map {}=<header> when committing.", field, field));
    }

    Ok(())
}

fn commit(ctx: &BudgetContext, args: CommitArgs) -> Result<()> {
    let CommitArgs {
        file,
        upload,
        profile,
        mappings,
        currency,
        save_profile,
        json,
    } = args;

    let (text, filename) = match upload {
        Some(key) => {
            let upload = ctx.upload_service.get(&key)?;
            (upload.text, upload.filename)
        }
        None => read_csv_input(file.as_deref())?,
    };

    // Profile, else auto-detect; explicit --map entries override either
    let (mut mapping, mut default_currency) = match &profile {
        Some(name) => {
            let profile = ctx
                .import_service
                .get_profile(name)?
                .ok_or_else(|| anyhow::anyhow!("Profile not found: {}", name))?;
            if !json {
                println!("Using profile '{}'", name);
            }
            (profile.mapping, profile.default_currency_code)
        }
        None => {
            let headers = parse_csv(&text).headers;
            let detected = suggest_mapping(&headers);
            if !json {
                print_mapping("Auto-detected columns:", &detected);
                println!();
            }
            (detected, None)
        }
    };

    for entry in &mappings {
        let (field, header) = parse_mapping_arg(entry)?;
        mapping.set(field, header);
    }
    if currency.is_some() {
        default_currency = currency;
    }

    let result = ctx.import_service.commit(
        &text,
        &mapping,
        &CommitOptions {
            filename: Some(filename),
            default_currency_code: default_currency.clone(),
        },
    )?;

    if let Some(name) = save_profile {
        ctx.import_service
            .save_profile(&name, &mapping, default_currency.as_deref())?;
        if !json {
            println!("Profile '{}' saved", name);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.failed_rows == 0 {
        output::success("Import complete");
    } else {
        output::warning("Import finished with errors");
    }
    println!();
    println!("  Rows: {}", result.total_rows);
    println!("  Imported: {}", result.success_rows);
    println!("  Failed: {}", result.failed_rows);
    println!(
        "  Created: {} transactions, {} accounts, {} categories, {} merchants, {} tags",
        result.created.transactions,
        result.created.accounts,
        result.created.categories,
        result.created.merchants,
        result.created.tags
    );

    if !result.errors.is_empty() {
        println!();
        println!("{}", "Errors:".red().bold());
        for error in result.errors.iter().take(10) {
            println!("  Row {}: {}", error.row_number, error.message);
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more (budget import errors {})", result.errors.len() - 10, result.import_job_id);
        }
    }

    Ok(())
}

fn jobs(ctx: &BudgetContext, json: bool) -> Result<()> {
    let jobs = ctx.import_service.list_jobs();

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No imports yet.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "File", "Status", "Started", "Rows", "Imported", "Failed"]);
    for job in jobs {
        table.add_row(vec![
            job.id.to_string(),
            job.upload_filename.clone(),
            format!("{:?}", job.status),
            job.started_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            job.total_rows.map(|n| n.to_string()).unwrap_or_default(),
            job.success_rows.to_string(),
            job.failed_rows.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn errors(ctx: &BudgetContext, job_id: &str, json: bool) -> Result<()> {
    let job_id = Uuid::parse_str(job_id.trim()).with_context(|| format!("Invalid UUID: {}", job_id))?;
    let errors = ctx.import_service.job_errors(job_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&errors)?);
        return Ok(());
    }

    if errors.is_empty() {
        println!("No errors recorded for this import.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Row", "Error", "Data"]);
    for error in errors {
        table.add_row(vec![
            error.row_number.to_string(),
            error.error_message,
            error.raw_data.unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn profiles(ctx: &BudgetContext, delete: Option<String>, json: bool) -> Result<()> {
    if let Some(name) = delete {
        let removed = ctx.import_service.delete_profile(&name)?;
        if json {
            println!("{}", serde_json::json!({ "deleted": removed }));
        } else if removed {
            println!("Profile '{}' deleted", name);
        } else {
            output::warning(&format!("Profile not found: {}", name));
        }
        return Ok(());
    }

    let profiles = ctx.import_service.list_profiles()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No saved profiles.");
        return Ok(());
    }

    println!("Saved import profiles:");
    let mut names: Vec<_> = profiles.keys().collect();
    names.sort();
    for name in names {
        let profile = &profiles[name];
        println!();
        println!("  {}", name.green());
        for (field, header) in profile.mapping.entries() {
            println!("    {}: {}", field, header);
        }
        if let Some(code) = &profile.default_currency_code {
            println!("    Currency: {}", code);
        }
    }
    Ok(())
}

fn print_mapping(title: &str, mapping: &CsvMapping) {
    output::info(title);
    for (field, header) in mapping.entries() {
        println!("  {}: {}", field, header);
    }
}

/// Parse `field=header`
fn parse_mapping_arg(entry: &str) -> Result<(CsvField, String)> {
    let (field, header) = entry
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected FIELD=HEADER, got \"{}\"", entry))?;
    let field: CsvField = field.parse().map_err(anyhow::Error::msg)?;
    Ok((field, header.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_arg() {
        let (field, header) = parse_mapping_arg("amount= Debit Amount").unwrap();
        assert_eq!(field, CsvField::Amount);
        assert_eq!(header, "Debit Amount");

        assert!(parse_mapping_arg("amount").is_err());
        assert!(parse_mapping_arg("balance=Bal").is_err());
    }

    #[test]
    fn test_map_overrides_detected_column() {
        let mut mapping = suggest_mapping(&["Date".to_string(), "Account".to_string(), "Debit".to_string()]);
        assert!(mapping.missing_required().is_some());

        let (field, header) = parse_mapping_arg("amount=Debit").unwrap();
        mapping.set(field, header);
        assert!(mapping.missing_required().is_none());
    }

    #[derive(clap::Parser)]
    struct ImportCli {
        #[command(subcommand)]
        command: ImportCommands,
    }

    #[test]
    fn test_commit_args_parse() {
        use clap::Parser;

        let cli = ImportCli::try_parse_from([
            "import", "commit", "bank.csv", "--map", "amount=Debit", "--map", "date=Posted", "--currency", "eur",
        ])
        .unwrap();
        let ImportCommands::Commit(args) = cli.command else {
            panic!("expected commit");
        };
        assert_eq!(args.file, Some(PathBuf::from("bank.csv")));
        assert_eq!(args.mappings, vec!["amount=Debit", "date=Posted"]);
        assert_eq!(args.currency.as_deref(), Some("eur"));
        assert!(!args.json);

        assert!(ImportCli::try_parse_from(["import", "commit", "bank.csv", "--upload", "key"]).is_err());
    }
}
