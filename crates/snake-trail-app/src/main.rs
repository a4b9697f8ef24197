use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            let subscriber = FmtSubscriber::builder()
                .with_max_level(Level::INFO)
                .with_env_filter("info")
                .with_ansi(false)
                .without_time()
                .with_writer(snake_trail_web::logging::ConsoleMakeWriter)
                .finish();
        } else {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(Level::INFO)
                .with_env_filter("info")
                .finish();
        }
    }
    let _ = tracing::subscriber::set_global_default(subscriber);

    info!("Snake trail starting");
    if cfg!(not(target_arch = "wasm32")) {
        error!("the snake trail draws on a browser canvas; build for wasm32 (trunk serve)");
        return;
    }
    if let Err(e) = snake_trail_web::run_app() {
        error!("Snake trail error: {e}");
    }
}
