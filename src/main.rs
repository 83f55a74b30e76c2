//! gvcftools: gVCF block compression, region editing, and multi-sample
//! merge.
//!
//! Usage: gvcftools <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use gvcftools::commands::{
    BreakBlocksCommand, CheckReferenceCommand, ExtractVariantsCommand, GatkToGvcfCommand,
    MergeGvcfCommand, SetHaploidCommand,
};
use gvcftools::context::Context;
use gvcftools::error::{GvcfError, Result};
use gvcftools::fasta::IndexedFasta;
use gvcftools::options::{BlockOptions, BlockerOptions};
use gvcftools::region_map::RegionMap;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "gvcftools")]
#[command(version)]
#[command(about = "gVCF block compression and region editing", long_about = None)]
struct Cli {
    /// Increase logging verbosity (repeatable: -v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress non-variant blocks and apply the standard filter set
    GatkToGvcf {
        /// Input gVCF (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Minimum GQX to pass (FILTER LowGQX)
        #[arg(long, default_value_t = 20.0)]
        min_gqx: f64,

        /// Per-chromosome mean-depth file (`<chrom>\t<mean_depth>` lines)
        #[arg(long)]
        chrom_depth_file: Option<PathBuf>,

        /// Max-depth filter factor relative to chromosome mean
        #[arg(long, default_value_t = 3.0)]
        max_depth_factor: f64,

        /// Minimum non-ref allele fraction that still allows blocking
        #[arg(long, default_value_t = 0.2)]
        min_blockable_nonref: f64,

        /// Non-variant block tolerance as a fraction of the block minimum
        #[arg(long, default_value_t = 0.3)]
        block_range_factor: f64,

        /// INFO flag label written on multi-observation blocks
        #[arg(long, default_value = "BLOCKAVG_min30p3a")]
        block_label: String,

        /// Suppress all header output (for concatenating with another
        /// gvcftools stream that already carries one)
        #[arg(long)]
        skip_header: bool,

        /// Drop the default GATK filter set (GQX filtering still applies)
        #[arg(long)]
        no_default_filters: bool,

        /// Permissive position ordering: drop regressive records instead of failing
        #[arg(long)]
        murdock: bool,
    },

    /// Expand non-variant blocks to one record per base inside a region
    BreakBlocks {
        /// Input gVCF (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reference FASTA (indexed with `samtools faidx`)
        #[arg(long)]
        r#ref: PathBuf,

        /// BED file of regions to expand
        #[arg(long)]
        region_file: PathBuf,
    },

    /// Coerce equal-allele diploid calls to haploid within a region
    SetHaploid {
        /// Input gVCF (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reference FASTA (indexed with `samtools faidx`)
        #[arg(long)]
        r#ref: PathBuf,

        /// BED file of regions to coerce
        #[arg(long)]
        region_file: PathBuf,

        /// FILTER label applied to heterozygous calls inside the region
        #[arg(long, default_value = "HAPLOID_CONFLICT")]
        haploid_conflict_label: String,
    },

    /// Co-traverse several single-sample gVCFs into one merged stream
    MergeGvcf {
        /// Per-sample gVCF files, in output column order
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Reference FASTA, needed to expand non-variant blocks during the merge
        #[arg(long)]
        r#ref: Option<PathBuf>,

        /// Permissive position ordering: drop regressive records instead of failing
        #[arg(long)]
        murdock: bool,
    },

    /// Diagnostic pass-through comparing REF against a FASTA
    CheckReference {
        /// Input gVCF (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reference FASTA (indexed with `samtools faidx`)
        #[arg(long)]
        r#ref: PathBuf,
    },

    /// Keep only records with at least one ALT allele
    ExtractVariants {
        /// Input gVCF (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn open_input(path: &Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p.to_string_lossy() != "-" => {
            Ok(Box::new(BufReader::new(File::open(p).map_err(GvcfError::Io)?)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn load_chrom_depth(path: &PathBuf) -> Result<FxHashMap<String, f64>> {
    let mut map = FxHashMap::default();
    let file = BufReader::new(File::open(path).map_err(GvcfError::Io)?);
    for (i, line) in file.lines().enumerate() {
        let line = line.map_err(GvcfError::Io)?;
        let mut cols = line.split('\t');
        let chrom = cols.next().ok_or_else(|| GvcfError::ParseFailure {
            line: i + 1,
            message: "missing chrom".to_string(),
        })?;
        let depth: f64 = cols
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| GvcfError::ParseFailure {
                line: i + 1,
                message: "missing or invalid mean depth".to_string(),
            })?;
        map.insert(chrom.to_string(), depth);
    }
    Ok(map)
}

fn run(cli: Cli, cmdline: String) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::GatkToGvcf {
            input,
            min_gqx,
            chrom_depth_file,
            max_depth_factor,
            min_blockable_nonref,
            block_range_factor,
            block_label,
            skip_header,
            no_default_filters,
            murdock,
        } => {
            let ctx = Context::new(cmdline).with_skip_header(skip_header).with_murdock_mode(murdock);
            let mut opts = BlockerOptions::with_defaults(!no_default_filters);
            opts.min_gqx = min_gqx;
            opts.max_chrom_depth_filter_factor = max_depth_factor;
            opts.min_nonref_blockable = min_blockable_nonref;
            opts.block = BlockOptions {
                frac_tol: block_range_factor,
                abs_tol: opts.block.abs_tol,
                block_label,
            };
            if let Some(path) = &chrom_depth_file {
                opts.chrom_depth = load_chrom_depth(path)?;
            }
            let cmd = GatkToGvcfCommand::new(opts);
            cmd.run(&ctx, open_input(&input)?, &mut out)
        }

        Commands::BreakBlocks { input, r#ref, region_file } => {
            let fasta = IndexedFasta::open(&r#ref)?;
            let region_map = RegionMap::from_bed_reader(BufReader::new(
                File::open(&region_file).map_err(GvcfError::Io)?,
            ))?;
            let cmd = BreakBlocksCommand::new(region_map, &fasta);
            cmd.run(open_input(&input)?, &mut out)
        }

        Commands::SetHaploid {
            input,
            r#ref,
            region_file,
            haploid_conflict_label,
        } => {
            let fasta = IndexedFasta::open(&r#ref)?;
            let region_map = RegionMap::from_bed_reader(BufReader::new(
                File::open(&region_file).map_err(GvcfError::Io)?,
            ))?;
            let cmd = SetHaploidCommand::new(region_map, &fasta, haploid_conflict_label);
            cmd.run(open_input(&input)?, &mut out)
        }

        Commands::MergeGvcf { inputs, r#ref, murdock } => {
            let fasta: Box<dyn gvcftools::fasta::FastaAccessor> = match &r#ref {
                Some(path) => Box::new(IndexedFasta::open(path)?),
                None => Box::new(gvcftools::fasta::InMemoryFasta::new()),
            };
            let readers: Result<Vec<_>> = inputs
                .iter()
                .map(|p| File::open(p).map(BufReader::new).map_err(GvcfError::Io))
                .collect();
            let cmd = MergeGvcfCommand;
            cmd.run(readers?, fasta.as_ref(), murdock, &mut out)
        }

        Commands::CheckReference { input, r#ref } => {
            let fasta = IndexedFasta::open(&r#ref)?;
            let cmd = CheckReferenceCommand::new(&fasta);
            cmd.run(open_input(&input)?, &mut out)
        }

        Commands::ExtractVariants { input } => {
            let cmd = ExtractVariantsCommand;
            cmd.run(open_input(&input)?, &mut out)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let cmdline = std::env::args().collect::<Vec<_>>().join(" ");
    if let Err(e) = run(cli, cmdline) {
        eprintln!("{}", e.diagnostic());
        process::exit(1);
    }
}

