use live_map::{settings::Settings, startup::App};
use tracing::info;

#[tokio::main]
async fn main() {
    let settings = Settings::new().unwrap();
    settings.init_tracer();

    let (app, handle) = App::build(&settings).unwrap();
    let mut binding = handle.binding();

    tokio::spawn(async move {
        while let Some(frame) = binding.changed().await {
            info!(
                "{} vessels, status: {:?}, push channel: {}",
                frame.vessels.len(),
                frame.status,
                frame.channel
            );
        }
    });

    // Without a map surface attached the viewport never changes and the engine tracks the
    // whole world. The handle is held for the lifetime of the process.
    let _handle = handle;
    app.run().await;
}
