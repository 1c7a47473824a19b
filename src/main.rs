// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! `texinfo`: decodes images and replays the texture upload against a
//! recording backend, so the GL sequence can be checked without a window.

use log::{error, info, LevelFilter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use texture2d::{RecordingBackend, Settings, Texture, TextureError, TextureImage, TextureUnit};

const USAGE: &str = "usage: texinfo [--config <settings.toml>] [--unit <n>] <image>...";

struct Args {
    config: Option<PathBuf>,
    unit: TextureUnit,
    images: Vec<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Args {
            config: None,
            unit: TextureUnit::TEXTURE0,
            images: Vec::new(),
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--unit" => {
                    let unit = args.next().ok_or("--unit needs a number")?;
                    let unit = unit
                        .parse()
                        .map_err(|_| format!("invalid texture unit {:?}", unit))?;
                    parsed.unit = TextureUnit(unit);
                }
                "-h" | "--help" => return Err(String::new()),
                _ => parsed.images.push(PathBuf::from(arg)),
            }
        }
        if parsed.images.is_empty() {
            return Err(String::from("no images given"));
        }
        Ok(parsed)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging(level: LevelFilter) {
    use tracing_subscriber::filter::LevelFilter as TracingLevel;

    let level = match level {
        LevelFilter::Off => TracingLevel::OFF,
        LevelFilter::Error => TracingLevel::ERROR,
        LevelFilter::Warn => TracingLevel::WARN,
        LevelFilter::Info => TracingLevel::INFO,
        LevelFilter::Debug => TracingLevel::DEBUG,
        LevelFilter::Trace => TracingLevel::TRACE,
    };
    if let Err(e) = tracing_subscriber::fmt().with_max_level(level).try_init() {
        eprintln!("Failed to install logger: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn init_logging(_level: LevelFilter) {}

fn inspect(path: &Path, settings: &Settings, unit: TextureUnit) -> Result<(), TextureError> {
    let image = TextureImage::from_path(path, settings.texture.flip_vertically)?;
    println!("{}", path.display());
    println!(
        "  {}x{} {:?}, {} bytes",
        image.width,
        image.height,
        image.layout,
        image.pixels.len()
    );
    if settings.texture.sampler.generate_mipmaps {
        println!("  mip levels: {}", image.mip_levels());
    }

    let gl = Rc::new(RecordingBackend::new());
    let mut texture = unsafe { Texture::from_image(&gl, &image, &settings.texture.sampler)? };
    texture.use_unit(unit)?;
    texture.dispose();

    for call in gl.calls() {
        println!("  {:?}", call);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{}", message);
            }
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let (settings, config_error) = match &args.config {
        Some(path) => match Settings::load_from_file(path) {
            Ok(settings) => (settings, None),
            Err(e) => (Settings::default(), Some((path.clone(), e))),
        },
        None => (Settings::load_user_settings(), None),
    };
    init_logging(settings.logging.level_filter());
    if let Some((path, e)) = config_error {
        error!("Failed to load settings from {:?}: {}. Using defaults.", path, e);
    }
    info!("Inspecting {} image(s)", args.images.len());

    let mut failed = false;
    for path in &args.images {
        if let Err(e) = inspect(path, &settings, args.unit) {
            error!("{}: {}", path.display(), e);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
