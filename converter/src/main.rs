//! o3forms CLI - Convert metadata workbooks to OpenMRS 3 forms
//!
//! # Main Commands
//!
//! ```bash
//! o3forms convert metadata.xlsx -o forms    # One JSON form per sheet
//! o3forms sheets metadata.xlsx              # List sheets and row counts
//! o3forms check forms/*.json                # Report dangling references
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! o3forms label "1.2 Age at enrollment"     # Normalize a label
//! o3forms id "Other" --answer-of ageGroup   # Normalize an identifier
//! o3forms skip "[Age Group] <> 'Other'"     # Compile a skip logic rule
//! o3forms validate forms/F01.json           # Schema-check a form
//! ```

use clap::{Parser, Subcommand};
use o3forms::logs::{count_level, take_history, LogFormat, LogLevel, LOGGER};
use o3forms::{
    check_form_text, check_references, compile_skip_expression, convert_workbook,
    normalize_identifier, normalize_label, write_forms, ConvertOptions, Form, IdRole, Workbook,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "o3forms")]
#[command(about = "Convert metadata workbooks to OpenMRS 3 form JSON", long_about = None)]
struct Cli {
    /// Suppress log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a workbook (xlsx/xls/ods file or directory of CSV sheets)
    Convert {
        /// Metadata workbook
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "forms")]
        output: PathBuf,

        /// Only convert these sheets (repeatable)
        #[arg(short, long = "sheet")]
        sheets: Vec<String>,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Name of the option sets sheet
        #[arg(long)]
        option_sets_sheet: Option<String>,

        /// 1-based row holding the column headers
        #[arg(long)]
        header_row: Option<usize>,

        /// Skip validation
        #[arg(long)]
        no_validate: bool,

        /// Print a reference report after conversion
        #[arg(long)]
        report: bool,
    },

    /// List the sheets of a workbook
    Sheets {
        /// Metadata workbook
        input: PathBuf,

        /// 1-based row holding the column headers
        #[arg(long, default_value = "2")]
        header_row: usize,
    },

    /// Normalize a label
    Label {
        text: String,
    },

    /// Normalize an identifier
    Id {
        text: String,

        /// Treat the text as an answer of this question id
        #[arg(long)]
        answer_of: Option<String>,
    },

    /// Compile a skip logic rule
    Skip {
        expression: String,
    },

    /// Validate form JSON files against the form schema
    Validate {
        /// Form JSON files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Check skip logic and calculations for dangling references
    Check {
        /// Form JSON files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOGGER.configure(cli.log_format, cli.quiet);

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            sheets,
            config,
            option_sets_sheet,
            header_row,
            no_validate,
            report,
        } => {
            let overrides = Overrides {
                sheets,
                option_sets_sheet,
                header_row,
                no_validate,
            };
            cmd_convert(&input, &output, config.as_deref(), overrides, report)
        }

        Commands::Sheets { input, header_row } => cmd_sheets(&input, header_row),

        Commands::Label { text } => {
            println!("{}", normalize_label(&text));
            Ok(())
        }

        Commands::Id { text, answer_of } => {
            let role = match answer_of.as_deref() {
                Some(question_id) => IdRole::Answer { question_id },
                None => IdRole::Question,
            };
            println!("{}", normalize_identifier(&text, role));
            Ok(())
        }

        Commands::Skip { expression } => {
            println!("{}", compile_skip_expression(&expression));
            Ok(())
        }

        Commands::Validate { inputs } => cmd_validate(&inputs),

        Commands::Check { inputs } => cmd_check(&inputs),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Command line values that win over config file and environment.
struct Overrides {
    sheets: Vec<String>,
    option_sets_sheet: Option<String>,
    header_row: Option<usize>,
    no_validate: bool,
}

impl Overrides {
    fn apply(self, mut options: ConvertOptions) -> Result<ConvertOptions, o3forms::ConfigError> {
        if !self.sheets.is_empty() {
            options.sheets = self.sheets;
        }
        if let Some(sheet) = self.option_sets_sheet {
            options.option_sets_sheet = sheet;
        }
        if let Some(row) = self.header_row {
            options.header_row = row;
        }
        if self.no_validate {
            options.skip_validation = true;
        }
        options.validate()
    }
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    overrides: Overrides,
    report: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = overrides.apply(ConvertOptions::load(config)?)?;

    let forms = convert_workbook(input, &options)?;
    let written = write_forms(&forms, output)?;

    let invalid: Vec<_> = forms.iter().filter(|f| !f.is_valid()).collect();
    for converted in &invalid {
        eprintln!("\n❌ {} invalid:", converted.sheet);
        for err in converted.validation_errors.iter().take(3) {
            eprintln!("   - {}", err);
        }
    }

    if report {
        let all: Vec<Form> = forms.iter().map(|f| f.form.clone()).collect();
        eprintln!();
        print!("{}", check_references(&all));
    }

    let warnings = count_level(&take_history(), LogLevel::Warning);
    eprintln!(
        "\n✨ Done! {} forms written to {} ({} invalid, {} warnings)",
        written.len(),
        output.display(),
        invalid.len(),
        warnings
    );
    Ok(())
}

fn cmd_sheets(input: &Path, header_row: usize) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📖 Workbook: {}", input.display());

    let workbook = Workbook::open(input)?;
    for name in workbook.sheet_names() {
        match workbook.sheet(name, header_row) {
            Ok(sheet) => println!(
                "{}\t{} rows\t{}",
                sheet.name,
                sheet.rows.len(),
                sheet.headers.join(", ")
            ),
            Err(e) => println!("{}\t{}", name, e),
        }
    }
    Ok(())
}

fn cmd_validate(inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut invalid = 0;

    for input in inputs {
        let content = fs::read_to_string(input)?;
        match check_form_text(&input.display().to_string(), &content) {
            Ok(()) => eprintln!("✅ {}", input.display()),
            Err(e) => {
                invalid += 1;
                eprintln!("❌ {}", e);
            }
        }
    }

    eprintln!("\n📊 Results: {} valid, {} invalid", inputs.len() - invalid, invalid);

    if invalid > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_check(inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut forms = Vec::with_capacity(inputs.len());
    for input in inputs {
        let content = fs::read_to_string(input)?;
        let form: Form = serde_json::from_str(&content)?;
        forms.push(form);
    }

    let report = check_references(&forms);
    print!("{}", report);

    if !report.is_clean() {
        eprintln!("⚠️  {} unresolved references", report.problem_count());
        std::process::exit(1);
    }
    Ok(())
}
