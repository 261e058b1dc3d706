//! Vision Tweaks command line entry point
//!
//! Reads a JSON scene document, computes sight for its source and prints the
//! sorted rays and sight polygons as JSON.
//!
//! Usage: `vision-tweaks <scene.json>`

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::fs;
    use std::path::PathBuf;

    use serde::{Deserialize, Serialize};

    use vision_tweaks::fog::{
        ExplorationBuffer, FogOutcome, FogPolicy, ObserverTable, RecomputeMarker, SourceId, update_fog,
    };
    use vision_tweaks::sight::{Ray, SightPolygons, SightRequest, Wall, compute_sight};
    use vision_tweaks::{LayeredSettings, Result, SceneDimensions, SceneFlags, WorldSettings};

    /// Scene description consumed by the CLI
    #[derive(Debug, Deserialize)]
    struct SceneDocument {
        request: SightRequest,
        #[serde(default)]
        walls: Vec<Wall>,
        #[serde(default)]
        dimensions: SceneDimensions,
        #[serde(default)]
        world: WorldSettings,
        #[serde(default)]
        flags: SceneFlags,
        #[serde(default = "default_source")]
        source: SourceId,
        /// Sources at least one player can observe
        #[serde(default)]
        observed: ObserverTable,
    }

    fn default_source() -> SourceId {
        SourceId::from("viewer")
    }

    #[derive(Debug, Serialize)]
    struct SightReport<'a> {
        distance: f64,
        density: f64,
        tolerance: f64,
        approximate: bool,
        fog: &'static str,
        rays: &'a [Ray],
        polygons: &'a SightPolygons,
    }

    pub fn run(path: PathBuf) -> Result<()> {
        let json = fs::read_to_string(&path)?;
        let doc: SceneDocument = serde_json::from_str(&json)?;
        log::info!("Loaded scene {} ({} walls)", path.display(), doc.walls.len());

        let provider = LayeredSettings::new(Some(&doc.flags), Some(&doc.world));
        let policy = FogPolicy::from_provider(&provider);
        let mut fog = ExplorationBuffer::new();
        let mut marker = RecomputeMarker::new();

        let (result, outcome) = marker.scoped(doc.source.clone(), |held| {
            let result = compute_sight(&doc.request, &doc.walls, &provider, &doc.dimensions)?;
            let outcome = update_fog(&mut fog, &policy, &doc.observed, held, &result.polygons);
            Ok((result, outcome))
        })?;

        let report = SightReport {
            distance: result.plan.distance,
            density: result.plan.density,
            tolerance: result.plan.tolerance.value(),
            approximate: result.plan.approximate,
            fog: match outcome {
                FogOutcome::Suppressed => "suppressed",
                FogOutcome::Contributed => "contributed",
                FogOutcome::ContributedAndCommitted => "committed",
            },
            rays: &result.rays,
            polygons: &result.polygons,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let Some(path) = std::env::args_os().nth(1) else {
        eprintln!("usage: vision-tweaks <scene.json>");
        std::process::exit(2);
    };

    if let Err(e) = cli::run(path.into()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
