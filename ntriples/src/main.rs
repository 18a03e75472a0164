use anyhow::{bail, Context};
use arp_api::condition::Severity;
use arp_ntriples::NTriplesWriter;
use arp_xml::{ArpError, ParserOptions, RdfXmlParser};
use clap::{Parser, ValueHint};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about, version, name = "arp-ntriples")]
/// Parses RDF/XML documents and writes their triples as N-Triples on the standard output
///
/// Conditions are written on the standard error as `<severity> <CODE> <line>:<column> <message>`.
struct Args {
    /// File(s) to parse
    ///
    /// The standard input is read if no file is given.
    #[arg(value_hint = ValueHint::FilePath)]
    files: Vec<PathBuf>,
    /// Base URI of the documents
    ///
    /// Defaults to the `file:` URL of each file. The standard input has no base by default.
    #[arg(short, long, value_hint = ValueHint::Url)]
    base: Option<String>,
    /// Ignores the warnings
    #[arg(long, conflicts_with = "strict")]
    lax: bool,
    /// Turns the warnings into errors
    #[arg(long)]
    strict: bool,
    /// Sets the severity of a condition, e.g. `WARN_MALFORMED_URI=error`
    #[arg(short, long = "error-mode", value_name = "CODE=SEVERITY")]
    error_mode: Vec<String>,
    /// Looks for rdf:RDF elements anywhere in the XML document
    #[arg(long)]
    embedding: bool,
    /// IRI syntax rules: `lax` or `strict`
    #[arg(long, value_name = "RULES")]
    iri_rules: Option<String>,
    /// Only checks the documents, no triple is written
    #[arg(short = 't', long)]
    check: bool,
    /// Reads each document in memory before walking it
    #[arg(long)]
    tree: bool,
}

pub fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let options = parser_options(&args)?;
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut problems = stderr.lock();

    let mut failed = false;
    if args.files.is_empty() {
        let mut parser = RdfXmlParser::new()
            .with_options(options)
            .with_system_id("-");
        if let Some(base) = &args.base {
            parser = parser.with_base_uri(base.as_str());
        }
        failed |= convert(&parser, io::stdin().lock(), &args, &mut output, &mut problems)?;
    } else {
        for file in &args.files {
            let base = match &args.base {
                Some(base) => base.clone(),
                None => file_url(file)?,
            };
            let parser = RdfXmlParser::new()
                .with_options(options)
                .with_base_uri(base)
                .with_system_id(file.display().to_string());
            let read = BufReader::new(
                File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
            );
            failed |= convert(&parser, read, &args, &mut output, &mut problems)?;
        }
    }
    output.flush()?;
    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn parser_options(args: &Args) -> anyhow::Result<ParserOptions> {
    let mut options = ParserOptions::default();
    if args.lax {
        options.set_property("error-mode", "lax")?;
    }
    if args.strict {
        options.set_property("error-mode", "strict")?;
    }
    if args.embedding {
        options.embedding = true;
    }
    if let Some(rules) = &args.iri_rules {
        options.set_property("iri-rules", rules)?;
    }
    for mode in &args.error_mode {
        let Some((code, severity)) = mode.split_once('=') else {
            bail!("Invalid error mode {}, expecting CODE=SEVERITY", mode);
        };
        options.set_property(code.trim(), severity.trim())?;
    }
    Ok(options)
}

/// Parses one document, returns `true` if an error or a fatal error was reported.
fn convert(
    parser: &RdfXmlParser,
    read: impl BufRead,
    args: &Args,
    output: &mut impl Write,
    problems: &mut impl Write,
) -> anyhow::Result<bool> {
    let mut writer = NTriplesWriter::new(&mut *output, &mut *problems);
    if args.check {
        writer = writer.check_only();
    }
    let result = if args.tree {
        parser.parse_buffered(read, &mut writer)
    } else {
        parser.parse(read, &mut writer)
    };
    let triple_count = writer.triple_count();
    let worst = writer.worst_severity();
    writer.finish().context("Failed to write a condition")?;
    debug!(triples = triple_count, "document converted");
    match result {
        Ok(()) => Ok(worst >= Some(Severity::Error)),
        // Already reported as a condition
        Err(ArpError::Fatal(_) | ArpError::Promoted(_) | ArpError::Xml(_)) => Ok(true),
        Err(e) => {
            error!("{}", e);
            Ok(true)
        }
    }
}

fn file_url(file: &Path) -> anyhow::Result<String> {
    let path = fs::canonicalize(file)
        .with_context(|| format!("Failed to resolve the path of {}", file.display()))?;
    let path = path.to_string_lossy().replace('\\', "/").replace(' ', "%20");
    Ok(if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        format!("file:///{}", path)
    })
}
