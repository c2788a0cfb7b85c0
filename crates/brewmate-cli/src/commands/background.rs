use std::path::PathBuf;

use brewmate_core::report::{save_background, DEFAULT_BACKGROUND_HEIGHT, DEFAULT_BACKGROUND_WIDTH};
use brewmate_core::{DataLayout, Settings};
use clap::Args;

#[derive(Args)]
pub struct BackgroundArgs {
    /// Output image (.jpg or .png)
    #[arg(default_value = "background.jpg")]
    pub output: PathBuf,
    #[arg(long, default_value_t = DEFAULT_BACKGROUND_WIDTH)]
    pub width: u32,
    #[arg(long, default_value_t = DEFAULT_BACKGROUND_HEIGHT)]
    pub height: u32,
    /// Also select the image as the custom background
    #[arg(long = "use")]
    pub use_it: bool,
}

pub fn run(layout: &DataLayout, args: BackgroundArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.width == 0 || args.height == 0 {
        return Err("width and height must be positive".into());
    }
    save_background(&args.output, args.width, args.height)?;
    println!("Background written: {}", args.output.display());

    if args.use_it {
        let path = layout.settings_file();
        let mut settings = Settings::load(&path);
        settings.set_custom_background(Some(std::path::absolute(&args.output)?))?;
        settings.save(&path)?;
        println!("Custom background updated");
    }
    Ok(())
}
