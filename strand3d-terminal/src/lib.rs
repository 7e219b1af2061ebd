/// Terminal viewer that animates a tessellated polyline
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use log::{debug, info};
use nalgebra::{Matrix4, Point3, Rotation3};
use std::f32::consts::TAU;
use std::io::{self, stdout, Write};
use std::thread;
use std::time::{Duration, Instant};
use strand3d_core::{JoinStyle, Mesh, Polyline, RayHit};

pub mod camera;
pub mod config;
pub mod renderer;

pub use camera::Camera;
pub use config::{ConfigError, ViewerConfig};
pub use renderer::AsciiRenderer;

#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Model orientation driven by the keyboard
#[derive(Debug, Clone, Copy, Default)]
struct Orbit {
    pitch: f32,
    yaw: f32,
}

impl Orbit {
    fn matrix(&self) -> Matrix4<f32> {
        Rotation3::from_euler_angles(self.pitch, self.yaw, 0.0).to_homogeneous()
    }
}

/// Raw mode, alternate screen and hidden cursor for as long as it lives
struct RawTerminal;

impl RawTerminal {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = RawTerminal;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let restored = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)
            .and_then(|_| terminal::disable_raw_mode());
        if let Err(e) = restored {
            log::warn!("Failed to restore terminal: {}", e);
        }
    }
}

/// Paces frames to a target rate and measures the rate actually reached
#[derive(Debug)]
struct FrameClock {
    frame_time: Duration,
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FrameClock {
    fn new(target_fps: u32) -> Self {
        Self {
            frame_time: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            window_start: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Sleep off whatever is left of the frame that began at `frame_start`,
    /// then refresh the FPS estimate once a second
    fn finish_frame(&mut self, frame_start: Instant) {
        if let Some(rest) = self.frame_time.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }

        self.frames += 1;
        let window = self.window_start.elapsed();
        if window >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / window.as_secs_f32();
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }
}

/// Point `index` of a helix that completes `spiral_turns` revolutions over
/// `max_points` points
pub fn spiral_point(config: &ViewerConfig, index: usize) -> Point3<f32> {
    let progress = index as f32 / (config.max_points.max(2) - 1) as f32;
    let angle = progress * config.spiral_turns * TAU;
    let radius = config.spiral_radius * (0.3 + 0.7 * progress);
    Point3::new(radius * angle.cos(), 2.0 * progress - 1.0, radius * angle.sin())
}

/// Main application struct for the terminal polyline viewer
pub struct PolylineViewer {
    config: ViewerConfig,
    polyline: Polyline,
    orbit: Orbit,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    frame: u64,
    elapsed: f32,
    last_hit: Option<RayHit>,
    clock: FrameClock,
}

impl PolylineViewer {
    /// Create a viewer sized to the current terminal
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        let (width, height) = terminal::size()?;
        Self::with_size(config, width as usize, height as usize)
    }

    /// Create a viewer drawing into a `width` x `height` character grid
    pub fn with_size(config: ViewerConfig, width: usize, height: usize) -> Result<Self, ViewerError> {
        config.validate()?;

        let polyline = Polyline::with_style(vec![vec![spiral_point(&config, 0)]], config.style);
        info!(
            "Viewer {}x{} with thickness {} and {:?} joins",
            width, height, config.style.thickness, config.style.join_style
        );

        Ok(Self {
            clock: FrameClock::new(config.target_fps),
            config,
            polyline,
            orbit: Orbit {
                pitch: 0.4,
                yaw: 0.0,
            },
            camera: Camera::new(width as u32, height as u32),
            renderer: AsciiRenderer::new(width, height),
            running: true,
            frame: 0,
            elapsed: 0.0,
            last_hit: None,
        })
    }

    pub fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    /// Animate until the user quits. The terminal is restored on every exit
    /// path, errors included.
    pub fn run(&mut self) -> Result<(), ViewerError> {
        let _terminal = RawTerminal::enter()?;
        let dt = self.clock.frame_time().as_secs_f32();
        info!("Animating at {} fps", self.config.target_fps);

        while self.running {
            let frame_start = Instant::now();

            // Drain every pending key so held keys don't lag behind
            while event::poll(Duration::ZERO)? {
                self.handle_input()?;
            }

            self.advance(dt);
            self.render()?;
            self.clock.finish_frame(frame_start);
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Char('w') | KeyCode::Up => self.orbit.pitch += 0.1,
                KeyCode::Char('s') | KeyCode::Down => self.orbit.pitch -= 0.1,
                KeyCode::Char('a') | KeyCode::Left => self.orbit.yaw -= 0.1,
                KeyCode::Char('d') | KeyCode::Right => self.orbit.yaw += 0.1,
                KeyCode::Char('j') => self.toggle_join_style(),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn toggle_join_style(&mut self) {
        let next = match self.polyline.join_style() {
            JoinStyle::Round => JoinStyle::Bevel,
            JoinStyle::Bevel => JoinStyle::Round,
        };
        debug!("Switching join style to {:?}", next);
        self.polyline.set_join_style(next);
    }

    /// Step the animation by `dt` seconds: grow the spiral, restart it once
    /// full, and pulse the thickness
    pub fn advance(&mut self, dt: f32) {
        self.frame += 1;
        self.elapsed += dt;
        self.orbit.yaw += 0.5 * dt;

        if self.frame % self.config.frames_per_point as u64 == 0 {
            let next = self.polyline.paths().last().map_or(0, Vec::len);
            if next >= self.config.max_points {
                debug!("Spiral complete, restarting");
                self.polyline
                    .set_paths(vec![vec![spiral_point(&self.config, 0)]]);
            } else if let Err(e) = self
                .polyline
                .append_point(spiral_point(&self.config, next))
            {
                log::error!("Failed to extend spiral: {}", e);
            }
        }

        let base = self.config.style.thickness;
        let pulse = 1.0 + self.config.thickness_pulse * (self.elapsed * self.config.pulse_speed).sin();
        self.polyline.set_thickness(base * pulse);
    }

    /// Expand the polyline for the current camera, and pick it with a ray
    /// through the screen center
    pub fn frame_mesh(&mut self) -> (Mesh, Matrix4<f32>) {
        let model = self.orbit.matrix();
        let inverse = model.try_inverse().unwrap_or_else(Matrix4::identity);

        let view = inverse.transform_vector(&self.camera.view_direction());
        let mesh = self.polyline.geometry().to_mesh(&view);

        let eye = inverse.transform_point(&self.camera.position);
        self.last_hit = mesh.raycast(&view, &eye);

        (mesh, model)
    }

    pub fn last_hit(&self) -> Option<RayHit> {
        self.last_hit
    }

    fn render(&mut self) -> io::Result<()> {
        let (mesh, model) = self.frame_mesh();

        self.renderer.clear();
        self.renderer.render_mesh(&mesh, &model, &self.camera);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        let pick = match self.last_hit {
            Some(hit) => format!("hit at {:.2}", hit.distance),
            None => "miss".to_string(),
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "strand3d | FPS: {:.1} | {:?} joins | {} vertices | center ray: {} | WASD=Rotate J=Join Q=Quit",
                self.clock.fps,
                self.polyline.join_style(),
                self.polyline.geometry().vertex_count(),
                pick
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
