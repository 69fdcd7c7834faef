use log::info;

mod components;

use components::App;

fn main() {
    // A missing .env file is fine
    dotenv::dotenv().ok();
    env_logger::init();

    info!("Starting Voice Dialer");

    // Launch the Dioxus desktop application
    dioxus::launch(App);
}
