//! This example shows how to render a CSV file into a map image using a JSON customization file.
//!
//! ```shell
//! cargo run --example render_csv -- mapcraft/examples/data/cities.csv mapcraft/examples/data/cities.json
//! ```
//!
//! The image is written to the path set in the `output` section of the configuration. Rows that
//! cannot be placed on the map (like the last row of `cities.csv`, which has no coordinates) are
//! skipped and reported in the log.

use anyhow::{anyhow, Result};
use mapcraft::config::MapConfig;
use mapcraft::dataset::CsvSource;
use mapcraft::pipeline::{DataSource, Pipeline};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (Some(csv_path), Some(config_path)) = (args.next(), args.next()) else {
        return Err(anyhow!(
            "This example must be run with two arguments - path to a .csv file and path to a .json configuration"
        ));
    };

    let config = MapConfig::from_json_path(&config_path)?;
    let dataset_name = config
        .layers
        .first()
        .map(|layer| layer.dataset_name().to_string())
        .ok_or_else(|| anyhow!("configuration has no layers"))?;

    let rows = CsvSource::from_path(&csv_path)?.read_rows()?;
    let output = Pipeline::new(config).run(vec![DataSource::new(dataset_name, rows)])?;

    log::info!(
        "Rendered {}x{} image: {} rows skipped, {} style fallbacks",
        output.image.width(),
        output.image.height(),
        output.skipped,
        output.fallbacks
    );

    Ok(())
}
