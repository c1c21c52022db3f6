use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tandem_base::{ModelId, SceneConfig};
use tandem_geometry::{Aabb, AlignmentRule, CompositeOffsets, Point3, Vec3};
use tandem_scene::{
    FrameSnapshot, ModelTransform, MutationSink, SceneController, SceneHost, SelectionSink,
    TransformPatch,
};
use tandem_view::{CubeMode, OrbitCamera, Point2, ViewCube, ViewTarget, pos2, vec2};
use tracing::info;

/// Upper bound on simulated frames for commands that run until settled.
const MAX_TICKS: usize = 10_000;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Tandem scene editor core: headless scenario runner")]
struct Cli {
    /// JSON scene configuration; built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the effective configuration.
    Config,
    /// Compute composite offsets from three bounding boxes.
    Align(AlignArgs),
    /// Run a scripted drag on one model and print the final transform.
    Drag(DragArgs),
    /// Fly the camera to a view cube face, edge or corner.
    Navigate(NavigateArgs),
    /// Count view cube inertia ticks for a release velocity.
    Inertia(InertiaArgs),
}

#[derive(Args)]
struct AlignArgs {
    /// Full reference box as min_x,min_y,min_z,max_x,max_y,max_z.
    #[arg(long)]
    reference: String,
    #[arg(long)]
    aligned: String,
    #[arg(long)]
    anchor: String,
}

#[derive(Args)]
struct DragArgs {
    /// Screen position where the gesture starts, as x,y.
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long, default_value_t = 1)]
    fingers: usize,
    #[arg(long, default_value_t = 10)]
    steps: usize,
    /// Initial model position as x,y,z.
    #[arg(long)]
    start: Option<String>,
    /// Camera position as x,y,z, looking at the origin.
    #[arg(long)]
    camera: Option<String>,
}

#[derive(Args)]
struct NavigateArgs {
    /// Target name such as top, front-right or top-front-left.
    #[arg(long)]
    target: String,
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

#[derive(Args)]
struct InertiaArgs {
    /// Release velocity in pixels per tick, as x,y.
    #[arg(long, default_value = "20,0")]
    velocity: String,
}

#[derive(Default)]
struct CliHost {
    selections: usize,
    updates: usize,
    frames: u64,
}

impl SelectionSink for CliHost {
    fn on_select(&mut self, id: ModelId) {
        info!(model = %id, "selected");
        self.selections += 1;
    }
}

impl MutationSink for CliHost {
    fn on_update(&mut self, _id: ModelId, _patch: &TransformPatch) {
        self.updates += 1;
    }
}

impl SceneHost for CliHost {
    fn render(&mut self, frame: &FrameSnapshot) {
        self.frames = frame.frame;
    }
}

#[derive(Serialize)]
struct AlignReport {
    ground_offset: [f64; 3],
    aligned_offset: [f64; 3],
    anchor_offset: [f64; 3],
    rotation_pivot: [f64; 3],
    world_pivot: [f64; 3],
    pivot_in_union: bool,
}

#[derive(Serialize)]
struct DragReport {
    transform: ModelTransform,
    selections: usize,
    updates: usize,
    frames: u64,
}

#[derive(Serialize)]
struct NavigateReport {
    target: String,
    ticks: usize,
    camera: OrbitCamera,
}

#[derive(Serialize)]
struct InertiaReport {
    ticks: usize,
    bound: usize,
    camera: OrbitCamera,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Config => print_json(&config),
        Command::Align(args) => align(&config, args),
        Command::Drag(args) => drag(config, args),
        Command::Navigate(args) => navigate(config, args),
        Command::Inertia(args) => inertia(&config, args),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn align(config: &SceneConfig, args: AlignArgs) -> Result<()> {
    let reference = parse_box(&args.reference).context("invalid --reference")?;
    let aligned = parse_box(&args.aligned).context("invalid --aligned")?;
    let anchor = parse_box(&args.anchor).context("invalid --anchor")?;
    let rule = AlignmentRule::from(&config.alignment);
    let offsets = CompositeOffsets::from_bounds(&reference, &aligned, &anchor, &rule);

    let world_pivot = offsets.world_pivot();
    print_json(&AlignReport {
        ground_offset: offsets.ground_offset.into(),
        aligned_offset: offsets.aligned_offset.into(),
        anchor_offset: offsets.anchor_offset.into(),
        rotation_pivot: offsets.rotation_pivot.into(),
        world_pivot: world_pivot.into(),
        pivot_in_union: offsets.pivot_in_union(),
    })
}

fn drag(config: SceneConfig, args: DragArgs) -> Result<()> {
    if args.steps == 0 {
        bail!("--steps must be at least 1");
    }
    if args.fingers == 0 {
        bail!("--fingers must be at least 1");
    }
    let from = parse_point2(&args.from).context("invalid --from")?;
    let to = parse_point2(&args.to).context("invalid --to")?;
    let start = match &args.start {
        Some(text) => parse_vec3(text).context("invalid --start")?,
        None => Vec3::new(0.0, 0.0, 0.0),
    };
    let camera = match &args.camera {
        Some(text) => {
            let eye = parse_vec3(text).context("invalid --camera")?;
            OrbitCamera::new(Point3::new(eye.x, eye.y, eye.z), Point3::new(0.0, 0.0, 0.0))
        }
        None => OrbitCamera::default(),
    };

    let mut scene = SceneController::new(config).context("invalid scene configuration")?;
    scene.mount_camera(camera);
    let id = scene.add_model(ModelTransform::at(start))?;
    let mut host = CliHost::default();
    let dt = 1.0 / 60.0;
    let mut now = Instant::now();

    for pointer in 0..args.fingers as u64 {
        scene.pointer_down(pointer + 1, from, Some(id));
    }
    // Report the full contact count once so the mode switch happens before motion.
    scene.pointer_move(1, from, args.fingers, &mut host);
    for step in 1..=args.steps {
        let t = step as f64 / args.steps as f64;
        let pos = pos2(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
        scene.pointer_move(1, pos, args.fingers, &mut host);
        now += Duration::from_secs_f64(dt);
        scene.tick(dt, now, &mut host);
    }
    scene.pointer_up(1, to, &mut host);
    scene.tick(dt, now + Duration::from_secs_f64(dt), &mut host);

    let transform = scene
        .transform(id)
        .copied()
        .context("model disappeared from the scene")?;
    info!(model = %id, updates = host.updates, "drag finished");
    print_json(&DragReport {
        transform,
        selections: host.selections,
        updates: host.updates,
        frames: host.frames,
    })
}

fn navigate(config: SceneConfig, args: NavigateArgs) -> Result<()> {
    let Some(target) = ViewTarget::parse(&args.target) else {
        bail!("unknown view target '{}'", args.target);
    };
    if args.fps.is_nan() || args.fps <= 0.0 {
        bail!("--fps must be positive");
    }
    let mut scene = SceneController::new(config).context("invalid scene configuration")?;
    scene.mount_camera(OrbitCamera::default());
    scene.navigate_to(target);

    let mut host = CliHost::default();
    let dt = 1.0 / args.fps;
    let mut ticks = 0;
    while scene.view_cube().mode() == CubeMode::Navigating {
        if ticks >= MAX_TICKS {
            bail!("navigation did not finish within {MAX_TICKS} ticks");
        }
        scene.tick(dt, Instant::now(), &mut host);
        ticks += 1;
    }
    let camera = *scene.camera().context("camera was unmounted")?;
    info!(view = %target.name(), ticks, "navigation finished");
    print_json(&NavigateReport {
        target: target.name(),
        ticks,
        camera,
    })
}

fn inertia(config: &SceneConfig, args: InertiaArgs) -> Result<()> {
    let velocity = parse_point2(&args.velocity).context("invalid --velocity")?;
    let velocity = vec2(velocity.x, velocity.y);
    let cube_config = config.view_cube.clone();
    let bound = if velocity.length() > cube_config.stop_velocity {
        ((cube_config.stop_velocity / velocity.length()).ln() / cube_config.damping.ln()).ceil()
            as usize
            + 1
    } else {
        0
    };

    let mut camera = OrbitCamera::default();
    let mut cube = ViewCube::new(cube_config);
    if !cube.fling(Some(&camera), velocity) {
        info!("velocity below release threshold; no inertia");
    }
    let mut ticks = 0;
    while cube.is_damping() {
        if ticks >= MAX_TICKS {
            bail!("inertia did not stop within {MAX_TICKS} ticks");
        }
        cube.tick(Some(&mut camera), 1.0 / 60.0);
        ticks += 1;
    }
    print_json(&InertiaReport {
        ticks,
        bound,
        camera,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

fn parse_numbers(text: &str, count: usize) -> Result<Vec<f64>> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != count {
        bail!("expected {count} comma-separated numbers, got '{text}'");
    }
    parts
        .iter()
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid number '{}'", part.trim()))
        })
        .collect()
}

fn parse_point2(text: &str) -> Result<Point2> {
    let values = parse_numbers(text, 2)?;
    Ok(pos2(values[0], values[1]))
}

fn parse_vec3(text: &str) -> Result<Vec3> {
    let values = parse_numbers(text, 3)?;
    Ok(Vec3::new(values[0], values[1], values[2]))
}

fn parse_box(text: &str) -> Result<Aabb> {
    let values = parse_numbers(text, 6)?;
    Ok(Aabb::new(
        Point3::new(values[0], values[1], values[2]),
        Point3::new(values[3], values[4], values[5]),
    ))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
