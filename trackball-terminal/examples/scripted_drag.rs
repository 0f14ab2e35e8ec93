/// Example: Drive the trackball without a terminal and print the view
///
/// Usage: cargo run --example scripted_drag -- [steps]
///
/// Replays a drag from the center of a 400x400 surface to its right edge,
/// then a roll around the outside of the silhouette, printing the
/// column-major view matrix after each move. Set RUST_LOG=trace to see the
/// drag session log.

use anyhow::Context;
use trackball_core::{PointerInput, SurfaceSize, TrackballRotator};

fn print_matrix(label: &str, m: &[f32; 16]) {
    println!("{label}");
    for row in 0..4 {
        println!(
            "  [{:8.4} {:8.4} {:8.4} {:8.4}]",
            m[row],
            m[4 + row],
            m[8 + row],
            m[12 + row]
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let steps: u32 = match std::env::args().nth(1) {
        Some(arg) => arg.parse().context("steps must be a positive integer")?,
        None => 4,
    };

    let mut rotator = TrackballRotator::new(SurfaceSize::new(400.0, 400.0))
        .with_redraw(|state| log::info!("redraw, forward = {:?}", state.forward()));
    print_matrix("initial view", &rotator.view_matrix_f32());

    // tilt: start on the pole and slide toward the right edge
    rotator.handle(PointerInput::MouseDown { x: 200.0, y: 200.0 });
    for i in 1..=steps {
        let x = 200.0 + 150.0 * f64::from(i) / f64::from(steps);
        rotator.handle(PointerInput::MouseMove { x, y: 200.0 });
        print_matrix(&format!("tilt step {i}"), &rotator.view_matrix_f32());
    }
    rotator.handle(PointerInput::MouseUp);

    // roll: a quarter turn around the corners, outside the silhouette
    let corners = [(380.0, 20.0), (20.0, 20.0)];
    rotator.handle(PointerInput::TouchStart(&corners[..1]));
    rotator.handle(PointerInput::TouchMove(&corners[1..]));
    rotator.handle(PointerInput::TouchEnd);
    print_matrix("after roll", &rotator.view_matrix_f32());

    Ok(())
}
