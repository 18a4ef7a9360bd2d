// What you SEE:
// • The canvas fills the window; COLORS (top-left) and MENU (top-right) sit on top.
// • A hand on the surface (or the held left mouse button) paints soft dabs.
// • Hold still for ~1 second and whatever is under the hand gets clicked.
// • Right mouse button clicks a widget directly. ESC quits.

use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use surface_canvas::camera::DepthCamera;
use surface_canvas::canvas::Canvas;
use surface_canvas::config::{Args, Config, SourceKind};
use surface_canvas::draw::{draw_crosshair, draw_dwell_ring, draw_text, BorderFade, Drawer};
use surface_canvas::layout::Layout;
use surface_canvas::pointer::PointerSynth;
use surface_canvas::storage::LocalStore;
use surface_canvas::types::FrameBuffer;
use surface_canvas::{Error, Frame, Reducer, Session};

/// Where this run's frames come from.
enum Source {
    Pointer(PointerSynth),
    Camera(DepthCamera),
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args)?;
    let (w, h) = (cfg.interaction.canvas_width, cfg.interaction.canvas_height);

    /* --- Frame source ---
       Visual: nothing yet; the camera (if any) starts streaming. */
    let mut source = match cfg.app.source {
        SourceKind::Camera => Source::Camera(DepthCamera::new(
            cfg.app.camera_index,
            cfg.subscription.clone(),
            cfg.depth.clone(),
        )?),
        SourceKind::Pointer => {
            cfg.subscription.validate()?;
            Source::Pointer(PointerSynth::new(
                cfg.subscription.point_limit,
                cfg.app.seed.unwrap_or(0xC0FFEE),
            ))
        }
    };

    /* --- Reducer + collaborators ---
       Visual: a blank canvas with the two header buttons. */
    let reducer = match cfg.app.seed {
        Some(seed) => Reducer::seeded(cfg.interaction.clone(), seed),
        None => Reducer::new(cfg.interaction.clone()),
    };
    let canvas = Canvas::new(w, h, cfg.interaction.background);
    let layout = Layout::new(w, h, &cfg.palette.colors, cfg.interaction.default_color);
    let store = LocalStore::new(&cfg.storage.dir, &cfg.storage.key);
    let store_path = store.path();
    info!(store = %store_path.display(), source = ?cfg.app.source, "starting");
    let mut session = Session::new(reducer, canvas, layout, store);

    let mut drawer = Drawer::new("Surface Canvas", w, h)?;
    let mut screen = FrameBuffer::filled(w, h, cfg.interaction.background);
    let border = BorderFade::new(Instant::now());

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) One frame of points from whichever source we have. */
        let frame: Option<Frame> = match &mut source {
            Source::Pointer(synth) => {
                let pts = synth.frame(drawer.mouse_pos(), drawer.left_mouse_down(), w, h);
                cfg.subscription.deliver(pts)
            }
            Source::Camera(cam) => match cam.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    // A dropped frame is not worth ending the session over.
                    warn!(error = %e, "skipping camera frame");
                    None
                }
            },
        };

        /* 2) Feed the reducer. Visual: a dab appears, or a widget gets clicked. */
        if let Some(frame) = frame {
            session.on_frame(&frame);
        }

        /* 3) Direct clicks from the mouse. */
        if drawer.right_clicked() {
            if let Some((mx, my)) = drawer.mouse_pos() {
                session.click_at(mx as f32, my as f32);
            }
        }

        /* 4) Compose: canvas or menu, then border, cursor and HUD on top. */
        session.ui.render(&session.surface.buffer, &mut screen);
        border.render(&mut screen, now, 12, cfg.app.border);

        if let Some(at) = session.reducer.cursor_on_screen() {
            let (cx, cy) = (at.x as i32, at.y as i32);
            draw_crosshair(&mut screen, cx, cy, 12, 0x00_FF_CC_33);
            draw_dwell_ring(&mut screen, cx, cy, 18.0, session.reducer.dwell_progress(), 0x00_33_CC_FF);
        }

        let state = session.reducer.state();
        let mode = if state.is_erasing { "ERASE".to_string() } else { state.active_color.to_string() };
        let hud = format!("{} | {} | DWELL {}/{} | {}",
            state.page.as_str(),
            mode,
            state.dwell_frames,
            session.reducer.config().frames_to_click(),
            hud_fps_text);
        draw_text(&mut screen, 8, h as i32 - 16, &hud, 0x00_80_80_80, 1);

        /* 5) Present to the window. */
        drawer.present(&screen)?;

        /* 6) FPS counter (logged + HUD once per second) */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            info!("FPS: {:.1} ({})", fps, state.page.as_str());
            hud_fps_text = format!("FPS: {:.1}", fps);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
