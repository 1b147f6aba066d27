use clap::{Parser, Subcommand};
use futures::executor::block_on;
use futures::future::LocalBoxFuture;
use image_stack::bridge::{CropUploader, UploadError, Uploader};
use image_stack::field::ImageField;
use image_stack::imaging::{EncodedImage, FetchPolicy, LoadError, LocalSourceLoader, PixelRect, SourceLoader};
use image_stack::intake::IntakeOutcome;
use image_stack::types::{ImageId, ImageList, SourceFile};
use image_stack::{config, output};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use walkdir::WalkDir;

fn version_string() -> &'static str {
    if env!("ON_RELEASE_TAG") == "true" {
        return env!("CARGO_PKG_VERSION");
    }
    match env!("GIT_HASH") {
        "" => "dev@unknown",
        // Leaked once at startup
        hash => Box::leak(format!("dev@{hash}").into_boxed_str()),
    }
}

#[derive(Parser)]
#[command(name = "image-stack")]
#[command(about = "Manage an ordered image list with a cover image")]
#[command(long_about = "\
Manage an ordered image list with a cover image

The list lives in a JSON state file. Every command loads it, applies one
change and writes the result back. The first image is the cover.

  image-stack add photos/              # embed every image under photos/
  image-stack add a.jpg --store up/    # copy into up/ instead of embedding
  image-stack cover 3                  # make image 3 the cover
  image-stack move 1 4                 # move image 1 to position 4
  image-stack crop 2 --zoom 1.5        # crop image 2 at 4:3, zoomed in
  image-stack list

Positions are 1-based, as shown by 'list'.

Run 'image-stack gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// JSON file holding the image list
    #[arg(long, default_value = "image-list.json", global = true)]
    state: PathBuf,

    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add image files (directories are searched recursively)
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Copy files into this directory instead of embedding them
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Remove the image at a position
    Remove { position: usize },
    /// Make the image at a position the cover
    Cover { position: usize },
    /// Move an image from one position to another
    Move { from: usize, to: usize },
    /// Crop the image at a position to the configured aspect ratio
    Crop {
        position: usize,
        /// Zoom factor, clamped to the configured range
        #[arg(long, value_parser = parse_zoom)]
        zoom: Option<f64>,
        /// Normalized window center as X,Y (0.0 to 1.0)
        #[arg(long, value_parser = parse_center)]
        center: Option<(f64, f64)>,
        /// Explicit pixel rectangle as X,Y,WIDTH,HEIGHT
        #[arg(long, value_parser = parse_rect)]
        rect: Option<PixelRect>,
        /// Write the crop into this directory instead of embedding it
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Show the image list
    List,
    /// Validate config and state without changing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn parse_finite(v: &str) -> Result<f64, String> {
    let value = v.trim().parse::<f64>().map_err(|e| format!("'{v}': {e}"))?;
    if !value.is_finite() {
        return Err(format!("'{v}' is not a finite number"));
    }
    Ok(value)
}

fn parse_zoom(s: &str) -> Result<f64, String> {
    parse_finite(s)
}

fn parse_center(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    Ok((parse_finite(x)?, parse_finite(y)?))
}

fn parse_rect(s: &str) -> Result<PixelRect, String> {
    let parts = s
        .split(',')
        .map(|v| v.trim().parse::<u32>().map_err(|e| format!("'{v}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [x, y, width, height] => Ok(PixelRect {
            x,
            y,
            width,
            height,
        }),
        _ => Err(format!("expected X,Y,WIDTH,HEIGHT, got '{s}'")),
    }
}

// ============================================================================
// Directory-backed collaborators
// ============================================================================

/// Stores files under a directory and hands back their absolute paths.
struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    fn new(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: std::path::absolute(dir)?,
        })
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let path = self.dir.join(name);
        std::fs::write(&path, bytes)?;
        Ok(path.display().to_string())
    }
}

impl Uploader for DirectoryStore {
    fn upload<'a>(&'a self, file: &'a SourceFile) -> LocalBoxFuture<'a, Result<String, UploadError>> {
        Box::pin(async move {
            let bytes = file.read()?;
            let name = format!("{}-{}", uuid::Uuid::new_v4().simple(), file.name());
            self.write(&name, &bytes)
        })
    }
}

impl CropUploader for DirectoryStore {
    fn upload_crop<'a>(
        &'a self,
        id: &'a ImageId,
        image: &'a EncodedImage,
    ) -> LocalBoxFuture<'a, Result<String, UploadError>> {
        Box::pin(async move {
            let name = format!("{id}-crop-{}.jpg", uuid::Uuid::new_v4().simple());
            self.write(&name, &image.bytes)
        })
    }
}

/// Loads absolute paths as given and relative ones against the directory
/// holding the state file.
struct StateDirLoader {
    absolute: LocalSourceLoader,
    relative: LocalSourceLoader,
}

impl StateDirLoader {
    fn new(state: &Path) -> Self {
        let dir = match state.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        Self {
            absolute: LocalSourceLoader::new("/"),
            relative: LocalSourceLoader::new(dir),
        }
    }
}

impl SourceLoader for StateDirLoader {
    fn load<'a>(
        &'a self,
        url: &'a str,
        policy: FetchPolicy,
    ) -> LocalBoxFuture<'a, Result<Arc<[u8]>, LoadError>> {
        if Path::new(url).is_absolute() {
            self.absolute.load(url, policy)
        } else {
            self.relative.load(url, policy)
        }
    }
}

// ============================================================================
// State file
// ============================================================================

fn load_state(path: &Path) -> Result<ImageList, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_state(path: &Path, list: &ImageList) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(list)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Files under `paths`: files as given, directories walked and sorted.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<SourceFile>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();
            found.sort();
            for file in found {
                files.push(SourceFile::from_path(&file)?);
            }
        } else {
            files.push(SourceFile::from_path(path)?);
        }
    }
    Ok(files)
}

/// Convert a 1-based position from the command line into an index.
fn index_of(position: usize, list: &ImageList) -> Result<usize, String> {
    if position == 0 || position > list.len() {
        return Err(format!(
            "position {position} is out of range (the list has {} image(s))",
            list.len()
        ));
    }
    Ok(position - 1)
}

fn check(config: &config::FieldConfig, list: &ImageList) -> Vec<String> {
    let mut problems = Vec::new();
    if list.len() > config.images.max_images {
        problems.push(format!(
            "{} images exceed the limit of {}",
            list.len(),
            config.images.max_images
        ));
    }
    let mut seen = HashSet::new();
    for record in list {
        if !seen.insert(record.id.as_str()) {
            problems.push(format!("duplicate id {}", record.id));
        }
    }
    problems
}

/// Apply one mutating command and write back whatever was committed.
/// Returns `false` when the operation failed; its notice says why.
fn mutate(
    command: Command,
    config: config::FieldConfig,
    state: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    let features = config.features.clone();
    let images = load_state(state)?;

    let committed: Rc<RefCell<Option<ImageList>>> = Rc::default();
    let sink = Rc::clone(&committed);
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for notice in rx {
            output::print_notice(&notice);
        }
    });
    let mut field = ImageField::new(config, move |list| *sink.borrow_mut() = Some(list))
        .with_notices(tx)
        .with_loader(StateDirLoader::new(state));

    let mut ok = true;
    match command {
        Command::Add { paths, store } => {
            if let Some(dir) = store {
                field = field.with_uploader(DirectoryStore::new(&dir)?);
            }
            let files = collect_files(&paths)?;
            println!("==> Adding {} file(s)", files.len());
            let outcome = block_on(field.add_files(&images, files));
            ok = matches!(outcome, IntakeOutcome::Committed { .. });
        }
        Command::Remove { position } => field.remove(&images, index_of(position, &images)?),
        Command::Cover { position } => {
            if !field.promote_to_cover(&images, index_of(position, &images)?) {
                println!("==> Nothing to do");
            }
        }
        Command::Move { from, to } => {
            let (from, to) = (index_of(from, &images)?, index_of(to, &images)?);
            if !field.reorder(&images, from, to) {
                println!("==> Nothing to do");
            }
        }
        Command::Crop {
            position,
            zoom,
            center,
            rect,
            store,
        } => {
            if let Some(dir) = store {
                field = field.with_crop_uploader(DirectoryStore::new(&dir)?);
            }
            let index = index_of(position, &images)?;
            ok = match block_on(field.open_crop(&images, index)) {
                Ok(mut session) => {
                    if let Some(zoom) = zoom {
                        session.set_zoom(zoom);
                    }
                    if let Some((x, y)) = center {
                        session.set_center(x, y);
                    }
                    if let Some(rect) = rect {
                        session.set_pixel_rect(rect);
                    }
                    let r = session.pixel_rect();
                    println!("==> Cropping {}x{} at ({}, {})", r.width, r.height, r.x, r.y);
                    block_on(field.save_crop(&images, &session)).is_ok()
                }
                Err(_) => false,
            };
        }
        // Read-only commands never reach here
        Command::List | Command::Check | Command::GenConfig => {}
    }

    drop(field);
    printer.join().map_err(|_| "notice printer panicked")?;

    if let Some(next) = committed.take() {
        save_state(state, &next)?;
        output::print_list(&next, &features);
    }
    Ok(ok)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::List => {
            let config = config::load_config(&cli.config)?;
            output::print_list(&load_state(&cli.state)?, &config.features);
        }
        Command::Check => {
            println!("==> Checking {}", cli.state.display());
            let config = config::load_config(&cli.config)?;
            let images = load_state(&cli.state)?;
            output::print_list(&images, &config.features);
            let problems = check(&config, &images);
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("    {problem}");
                }
                return Err(format!("{} problem(s) found", problems.len()).into());
            }
            println!("==> State is valid");
        }
        command => {
            let config = config::load_config(&cli.config)?;
            if !mutate(command, config, &cli.state)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn zoom_and_center_reject_non_finite() {
        assert_eq!(parse_zoom("1.5"), Ok(1.5));
        assert!(parse_zoom("NaN").is_err());
        assert!(parse_zoom("inf").is_err());
        assert_eq!(parse_center("0.25, 0.75"), Ok((0.25, 0.75)));
        assert!(parse_center("NaN,0.5").is_err());
        assert!(parse_center("0.5,-inf").is_err());
    }

    #[test]
    fn rect_needs_four_values() {
        assert_eq!(
            parse_rect("1,2,3,4"),
            Ok(PixelRect {
                x: 1,
                y: 2,
                width: 3,
                height: 4
            })
        );
        assert!(parse_rect("1,2,3").is_err());
    }

    #[test]
    fn relative_urls_resolve_next_to_state_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("uploads")).unwrap();
        std::fs::write(tmp.path().join("uploads/a.jpg"), [1u8, 2]).unwrap();
        let loader = StateDirLoader::new(&tmp.path().join("image-list.json"));

        let bytes = block_on(loader.load("uploads/a.jpg", FetchPolicy::SameOrigin)).unwrap();
        assert_eq!(&*bytes, &[1, 2]);

        let absolute = tmp.path().join("uploads/a.jpg");
        let url = absolute.display().to_string();
        let bytes = block_on(loader.load(&url, FetchPolicy::SameOrigin)).unwrap();
        assert_eq!(&*bytes, &[1, 2]);
    }

    #[test]
    fn bare_state_file_name_uses_working_directory() {
        let loader = StateDirLoader::new(Path::new("image-list.json"));
        let result = block_on(loader.load("definitely-missing.jpg", FetchPolicy::SameOrigin));
        let Err(LoadError::Io { path, .. }) = result else {
            panic!("expected an IO error");
        };
        assert_eq!(path, Path::new(".").join("definitely-missing.jpg"));
    }
}
