use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::PathBuf;

use duckdb_metadata::{pad_32, ExtensionAbiType, MetadataFields, SIGNATURE_LEN};

/// Appends the duckdb extension metadata footer to a built library.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(long)]
    output: PathBuf,

    #[clap(long)]
    input: PathBuf,

    #[clap(long)]
    extension_version: String,

    /// Version of duckdb the extension was built against, e.g. `v1.0.0`
    #[clap(long)]
    duckdb_version: String,

    /// Full list on https://duckdb.org/docs/extensions/working_with_extensions.html#platforms
    #[clap(long)]
    platform: String,

    #[clap(long, default_value = "4")]
    metadata_version: String,

    #[clap(long, default_value = "CPP")]
    extension_abi_type: String,
}

impl Args {
    fn metadata_fields(&self) -> Result<MetadataFields> {
        let extension_abi_type = ExtensionAbiType::parse(&self.extension_abi_type)?;

        Ok(MetadataFields {
            meta_8: [0; 32],
            meta_7: [0; 32],
            meta_6: [0; 32],
            extension_abi_type: pad_32(extension_abi_type.as_ref().as_bytes())
                .context("extension_abi_type")?,
            extension_version: pad_32(self.extension_version.as_bytes())
                .context("extension_version")?,
            duckdb_version: pad_32(self.duckdb_version.as_bytes()).context("duckdb_version")?,
            platform: pad_32(self.platform.as_bytes()).context("platform")?,
            metadata_version: pad_32(self.metadata_version.as_bytes())
                .context("metadata_version")?,
            signature: [0; SIGNATURE_LEN],
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let metadata_fields = args.metadata_fields()?;

    let mut input_file = File::open(&args.input)
        .with_context(|| format!("failed to open input file: {:?}", args.input))?;

    let mut output_file = File::create(&args.output)
        .with_context(|| format!("failed to create output file: {:?}", args.output))?;

    io::copy(&mut input_file, &mut output_file)?;

    metadata_fields
        .write(&mut output_file)
        .context("failed to write metadata to output file")?;

    let mut written = File::open(&args.output)
        .with_context(|| format!("failed to reopen output file: {:?}", args.output))?;
    let footer = read_footer(&mut written).context("failed to verify metadata footer")?;
    anyhow::ensure!(footer == metadata_fields, "metadata footer does not match");

    println!("output generated {:?}", args.output);

    Ok(())
}

/// Reads back the footer of a generated extension.
fn read_footer(file: &mut File) -> Result<MetadataFields> {
    let footer_len = MetadataFields::footer_len()? as i64;
    file.seek(SeekFrom::End(-footer_len))
        .context("file is shorter than a metadata footer")?;

    let mut footer = Vec::new();
    io::Read::read_to_end(file, &mut footer)?;

    Ok(MetadataFields::from_footer(&footer)?)
}
