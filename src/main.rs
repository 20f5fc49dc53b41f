use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use astro_rgb::image_pipeline::{
    Compositor, ConversionConfig, ObservationMeta, RawLoaderReader, RawToTiffPipeline,
    StandardTiffWriter, TiffCompression,
};
use astro_rgb::logger;

use tracing::{error, info};

fn usage() -> String {
    "usage: astro_rgb <raw file> [output base]".to_string()
}

fn main() -> anyhow::Result<()> {
    logger::init();

    let mut args = env::args_os().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!(usage());
    };
    let base = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| input.with_extension(""));

    info!("Starting astro_rgb...");

    let config = ConversionConfig::builder()
        .compression(TiffCompression::Lzw)
        .build();
    let pipeline = RawToTiffPipeline::new(config);
    let compositor = Compositor::default();

    info!("Compression: {:?}", pipeline.config().compression);
    info!("Demosaic: {:?}", pipeline.config().decode.demosaic);

    if let Err(e) = run(&pipeline, &compositor, &input, &base) {
        error!("Processing failed: {:#}", e);
        return Err(e);
    }

    info!("Done");
    Ok(())
}

fn run(
    pipeline: &RawToTiffPipeline<RawLoaderReader, StandardTiffWriter>,
    compositor: &Compositor,
    input: &Path,
    base: &Path,
) -> anyhow::Result<()> {
    let preview = base.with_extension("tiff");
    let image = pipeline
        .convert_file(input, &preview)
        .with_context(|| format!("converting {}", input.display()))?;
    info!(
        width = image.width(),
        height = image.height(),
        output = %preview.display(),
        "Wrote preview"
    );

    let outputs = compositor
        .split(&image, base, &ObservationMeta::default())
        .context("splitting channels")?;
    info!(
        red = %outputs.red.display(),
        green = %outputs.green.display(),
        blue = %outputs.blue.display(),
        "Wrote channel units"
    );

    let merged = compositor
        .merge(&outputs.red, &outputs.green, &outputs.blue)
        .context("merging channels")?;
    if merged.samples() != image.samples() {
        bail!("merged channels differ from the decoded image");
    }
    info!(width = merged.width(), height = merged.height(), "Channels merged back");

    Ok(())
}
