#![allow(clippy::cast_precision_loss)]
//! Demo rendering a synthetic dataset in every render mode.
//!
//! Demonstrates:
//! - Building a dataset from a function
//! - Switching interpolation and render modes
//! - Editing the 1D transfer function
//! - Cancelling a render from another thread
//!
//! Run with `RUST_LOG=info` to see per-pass timings.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use volvis::{
    Dataset, InterpolationMode, RenderConfig, RenderMode, RenderStatus, Tf2dParams, UVec3, Vec3,
    Vec4,
};

/// Two nested shells: a dense core inside a thinner halo.
fn shells(dim: UVec3) -> Dataset {
    let center = dim.as_vec3() / 2.0;
    let radius = dim.min_element() as f32 / 2.0;
    Dataset::from_fn(dim, |x, y, z| {
        let r = (Vec3::new(x as f32, y as f32, z as f32) - center).length() / radius;
        if r < 0.4 {
            220.0
        } else if r < 0.8 {
            90.0 + 20.0 * (r * 25.0).sin()
        } else {
            0.0
        }
    })
    .expect("demo volume is not empty")
}

fn coverage(frame: &[Vec4]) -> f32 {
    frame.iter().filter(|p| p.w > 0.0).count() as f32 / frame.len() as f32
}

fn main() {
    env_logger::init();

    let dataset = shells(UVec3::new(96, 96, 64));
    dataset.set_interpolation_mode(InterpolationMode::Linear);

    let mut transfer_function = dataset.transfer_function();
    let halo = transfer_function.insert_point(0.45, 0.05);
    transfer_function.set_point_color(halo, Vec4::new(0.2, 0.6, 1.0, 0.05));

    let mut base = dataset.default_config().with_resolution(256, 256);
    transfer_function.update_render_config(&mut base);

    let mut renderer = dataset.renderer(base.clone()).expect("valid default config");

    for mode in RenderMode::ALL {
        let config = RenderConfig {
            render_mode: mode,
            volume_shading: matches!(mode, RenderMode::Iso | RenderMode::Tf2d),
            iso_value: 150.0,
            bisection: true,
            tf2d: Tf2dParams {
                color: Vec4::new(1.0, 0.6, 0.2, 0.4),
                radius: 30.0,
                intensity: 100.0,
                magnitude: 0.6,
            },
            ..base.clone()
        };
        renderer.set_config(config).expect("valid config");
        renderer.render().expect("render failed");
        log::info!(
            "{:<22} coverage {:>5.1}%",
            mode.name(),
            coverage(renderer.frame_buffer()) * 100.0
        );
    }

    for interpolation in InterpolationMode::ALL {
        dataset.set_interpolation_mode(interpolation);
        renderer
            .set_config(base.clone().with_render_mode(RenderMode::Mip))
            .expect("valid config");
        renderer.render().expect("render failed");
        log::info!(
            "MIP with {interpolation} interpolation, coverage {:.1}%",
            coverage(renderer.frame_buffer()) * 100.0
        );
    }

    let cancel = AtomicBool::new(false);
    let status = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(5));
            cancel.store(true, Ordering::Relaxed);
        });
        renderer
            .set_config(base.with_render_mode(RenderMode::Composite).with_resolution(1024, 1024))
            .expect("valid config");
        renderer.render_cancellable(&cancel).expect("render failed")
    });
    match status {
        RenderStatus::Completed => log::info!("large composite pass finished before cancellation"),
        RenderStatus::Cancelled => log::info!("large composite pass cancelled"),
    }
}
