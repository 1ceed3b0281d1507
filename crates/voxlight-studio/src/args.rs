//! Command line parsing.

use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command, ValueHint};

use crate::presets::PRESET_NAMES;

pub fn is_positive_number(num: &str) -> Result<(), String> {
    match num.parse::<u32>() {
        Ok(n) if n > 0 => Ok(()),
        Ok(_) => Err("Number must be greater than 0".into()),
        Err(_) => Err("Number required".into()),
    }
}

pub fn is_speed(num: &str) -> Result<(), String> {
    match num.parse::<u32>() {
        Ok(n) if n <= voxlight_engine::animation::SPEED_MAX => Ok(()),
        Ok(_) => Err(format!("Speed must be in range <0;{}>", voxlight_engine::animation::SPEED_MAX)),
        Err(_) => Err("Number required".into()),
    }
}

pub fn get_command<'a>() -> Command<'a> {
    Command::new("voxlight")
        .version(env!("CARGO_PKG_VERSION"))
        .about("GPU ray-casting volume viewer with animated transfer functions")
        .arg(
            Arg::new("size")
                .help("Edge length of the generated phantom, in voxels")
                .long("size")
                .short('n')
                .value_name("VOXELS")
                .default_value("128")
                .validator(is_positive_number),
        )
        .arg(
            Arg::new("preset")
                .help("Transfer functions added at startup")
                .long("preset")
                .short('p')
                .value_name("NAME")
                .multiple_occurrences(true)
                .possible_values(PRESET_NAMES),
        )
        .arg(
            Arg::new("load")
                .help("Transfer function stack to load (PNG, 4096 pixels wide)")
                .long("load")
                .short('l')
                .value_name("FILE")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("save")
                .help("Where `S` writes the transfer function stack")
                .long("save")
                .short('o')
                .value_name("FILE")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::FilePath)
                .default_value("transfer-functions.png"),
        )
        .arg(
            Arg::new("thumbnails")
                .help("Directory `T` writes table thumbnails into")
                .long("thumbnails")
                .value_name("DIR")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("rotation")
                .help("Camera rotation speed")
                .long("rotation")
                .value_name("0-99")
                .default_value("20")
                .validator(is_speed),
        )
        .arg(
            Arg::new("transition")
                .help("Transfer function transition speed")
                .long("transition")
                .value_name("0-99")
                .default_value("20")
                .validator(is_speed),
        )
        .arg(
            Arg::new("shader-dir")
                .help("Directory searched for shaders before the bundled copies")
                .long("shader-dir")
                .value_name("DIR")
                .allow_invalid_utf8(true)
                .value_hint(ValueHint::DirPath),
        )
}

/// Parsed studio options.
#[derive(Debug, Clone)]
pub struct StudioArgs {
    pub size: u32,
    pub presets: Vec<String>,
    pub load: Option<PathBuf>,
    pub save: PathBuf,
    pub thumbnails: Option<PathBuf>,
    pub rotation: u32,
    pub transition: u32,
    pub shader_dir: Option<PathBuf>,
}

impl StudioArgs {
    /// Reads options from validated matches.
    pub fn from_matches(m: &ArgMatches) -> Result<Self, String> {
        let number = |name: &str| -> Result<u32, String> {
            m.value_of(name)
                .ok_or_else(|| format!("missing --{name}"))?
                .parse::<u32>()
                .map_err(|e| format!("--{name}: {e}"))
        };
        let path = |name: &str| m.value_of_os(name).map(PathBuf::from);

        Ok(Self {
            size: number("size")?,
            presets: m
                .values_of("preset")
                .map(|v| v.map(str::to_string).collect())
                .unwrap_or_default(),
            load: path("load"),
            save: path("save").unwrap_or_else(|| PathBuf::from("transfer-functions.png")),
            thumbnails: path("thumbnails"),
            rotation: number("rotation")?,
            transition: number("transition")?,
            shader_dir: path("shader-dir"),
        })
    }
}
