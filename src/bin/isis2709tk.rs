//! `isis2709tk`: convert bibliographic records between ISO 2709,
//! CDS/ISIS Master File (MST+XRF), and JSONL.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use isis2709tk::dict::{self, Dict};
use isis2709tk::encoding;
use isis2709tk::geometry::Geometry;
use isis2709tk::iso::{IsoReader, IsoWriter};
use isis2709tk::linewrap::{LineUnwrapReader, LineWrapWriter};
use isis2709tk::mst::{MstReader, MstWidth};
use isis2709tk::subfield::SubfieldMode;
use isis2709tk::IsisError;

#[derive(Parser)]
#[command(name = "isis2709tk", about = "Convert records between ISO 2709, MST+XRF, and JSONL")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// ISO 2709 stream -> JSONL
    Iso2jsonl {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(long, default_value_t = 0)]
        line_len: usize,
        #[arg(default_value = "-")]
        input: String,
        #[arg(default_value = "-")]
        output: String,
    },
    /// JSONL -> ISO 2709 stream
    Jsonl2iso {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(long, default_value_t = 0)]
        line_len: usize,
        #[arg(long, default_value = "#")]
        field_terminator: String,
        #[arg(long, default_value = "#")]
        record_terminator: String,
        #[arg(default_value = "-")]
        input: String,
        #[arg(default_value = "-")]
        output: String,
    },
    /// CDS/ISIS Master File -> JSONL
    Mst2jsonl {
        #[command(flatten)]
        common: CommonOpts,
        #[arg(long, value_enum, default_value_t = CliMstWidth::Isis)]
        mst_width: CliMstWidth,
        #[arg(long)]
        only_active: bool,
        mst_path: PathBuf,
        #[arg(default_value = "-")]
        output: String,
    },
}

#[derive(clap::Args)]
struct CommonOpts {
    #[arg(long, default_value = encoding::DEFAULT_JSONL_ENCODING)]
    jenc: String,
    #[arg(long, default_value = encoding::DEFAULT_ISO_ENCODING)]
    ienc: String,
    #[arg(short = 'm', long, value_enum, default_value_t = CliSubfieldMode::Field)]
    mode: CliSubfieldMode,
    #[arg(long)]
    no_number: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliSubfieldMode {
    Field,
    Pairs,
    Nest,
}

impl From<CliSubfieldMode> for SubfieldMode {
    fn from(m: CliSubfieldMode) -> Self {
        match m {
            CliSubfieldMode::Field => SubfieldMode::Field,
            CliSubfieldMode::Pairs => SubfieldMode::Pairs,
            CliSubfieldMode::Nest => SubfieldMode::Nest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliMstWidth {
    Isis,
    Ffi,
}

impl From<CliMstWidth> for MstWidth {
    fn from(w: CliMstWidth) -> Self {
        match w {
            CliMstWidth::Isis => MstWidth::Isis16,
            CliMstWidth::Ffi => MstWidth::Ffi32,
        }
    }
}

fn open_input(path: &str) -> io::Result<Box<dyn Read>> {
    if path == "-" {
        Ok(Box::new(io::stdin()))
    } else {
        Ok(Box::new(File::open(path)?))
    }
}

fn open_output(path: &str) -> io::Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(io::stdout()))
    } else {
        Ok(Box::new(File::create(path)?))
    }
}

fn single_byte(flag: &str, s: &str) -> Result<u8, IsisError> {
    let bytes = s.as_bytes();
    if bytes.len() != 1 {
        return Err(IsisError::format(format!("--{flag} expects a single byte, got `{s}`"), 0));
    }
    Ok(bytes[0])
}

fn run_iso2jsonl(common: CommonOpts, line_len: usize, input: String, output: String) -> Result<(), IsisError> {
    let r: Box<dyn Read> = open_input(&input)?;
    let w = open_output(&output)?;
    let mut out = BufWriter::new(w);

    let mode = Some((SubfieldMode::from(common.mode), !common.no_number));
    let geom = Geometry::default();
    let reader: Box<dyn Iterator<Item = isis2709tk::Result<isis2709tk::IsoRecord>>> = if line_len > 0 {
        Box::new(IsoReader::new(LineUnwrapReader::new(r, line_len, b'\n'), geom))
    } else {
        Box::new(IsoReader::new(r, geom))
    };

    for rec in reader {
        let rec = rec?;
        let d: Dict = dict::to_dict(&rec.fields, &common.ienc, mode)?;
        let json = serde_json::to_string(&d).map_err(|e| IsisError::format(e.to_string(), 0))?;
        writeln!(out, "{json}")?;
    }
    Ok(())
}

fn run_jsonl2iso(
    common: CommonOpts,
    line_len: usize,
    field_terminator: String,
    record_terminator: String,
    input: String,
    output: String,
) -> Result<(), IsisError> {
    let r = open_input(&input)?;
    let w = open_output(&output)?;

    let geom = Geometry {
        field_terminator: single_byte("field-terminator", &field_terminator)?,
        record_terminator: single_byte("record-terminator", &record_terminator)?,
        ..Geometry::default()
    };
    let mode = SubfieldMode::from(common.mode);

    let rows = BufReader::new(r).lines();

    if line_len > 0 {
        let mut iso = IsoWriter::new(LineWrapWriter::new(w, line_len, b'\n'), geom);
        for line in rows {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(&line).map_err(|e| IsisError::format(e.to_string(), 0))?;
            let d: Dict = serde_json::from_value(value).map_err(|e| IsisError::format(e.to_string(), 0))?;
            let rec = dict::from_dict(&d, &geom, &common.jenc, Some(mode))?;
            iso.write_record(&rec)?;
        }
        iso.into_inner().finish()?;
    } else {
        let mut iso = IsoWriter::new(w, geom);
        for line in rows {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(&line).map_err(|e| IsisError::format(e.to_string(), 0))?;
            let d: Dict = serde_json::from_value(value).map_err(|e| IsisError::format(e.to_string(), 0))?;
            let rec = dict::from_dict(&d, &geom, &common.jenc, Some(mode))?;
            iso.write_record(&rec)?;
        }
    }
    Ok(())
}

fn run_mst2jsonl(
    common: CommonOpts,
    mst_width: CliMstWidth,
    only_active: bool,
    mst_path: PathBuf,
    output: String,
) -> Result<(), IsisError> {
    let w = open_output(&output)?;
    let mut out = BufWriter::new(w);
    let mode = Some((SubfieldMode::from(common.mode), !common.no_number));

    let mut reader = MstReader::open(&mst_path, mst_width.into())?;
    for rec in reader.iter_records(only_active) {
        let rec = rec?;
        let fields_dict = dict::to_dict(&rec.fields, &common.ienc, mode)?;
        let mut d: Dict = Dict::new();
        d.insert(dict::MFN_KEY.to_string(), vec![serde_json::Value::from(rec.mfn)]);
        d.insert(dict::ACTIVE_KEY.to_string(), vec![serde_json::Value::from(rec.active)]);
        d.extend(fields_dict);
        let json = serde_json::to_string(&d).map_err(|e| IsisError::format(e.to_string(), 0))?;
        writeln!(out, "{json}")?;
    }
    Ok(())
}

fn exit_code_for(err: &IsisError) -> u8 {
    match err {
        IsisError::Format { .. } | IsisError::Truncated { .. } | IsisError::Overflow { .. } | IsisError::Xrf { .. } => 1,
        IsisError::Io(_) | IsisError::Encoding { .. } => 2,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Iso2jsonl { common, line_len, input, output } => run_iso2jsonl(common, line_len, input, output),
        Command::Jsonl2iso { common, line_len, field_terminator, record_terminator, input, output } => {
            run_jsonl2iso(common, line_len, field_terminator, record_terminator, input, output)
        }
        Command::Mst2jsonl { common, mst_width, only_active, mst_path, output } => {
            run_mst2jsonl(common, mst_width, only_active, mst_path, output)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}
