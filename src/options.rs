use clap::{Parser, Subcommand};

/// Renogy Modbus - decode and encode Renogy charge controller register blocks
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read [default: config.yaml, if present]
    #[clap(short = 'c', long = "config")]
    pub config_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a raw register capture and print it as JSON
    Decode {
        file: String,

        /// Input is a full RTU read response frame, not a bare register block
        #[clap(long)]
        frame: bool,
    },

    /// Encode a JSON snapshot back into the register block
    Encode {
        file: String,

        /// Write the raw bytes here instead of printing hex
        #[clap(short = 'o', long = "output")]
        output: Option<String>,

        /// Wrap the block in an RTU write request frame
        #[clap(long)]
        frame: bool,
    },

    /// Print the RTU read request frame for the configured slave
    Request,

    /// Copy a raw register capture into the capture directory
    Store { file: String },
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}
