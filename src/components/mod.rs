pub mod app;
pub mod call_control_buttons;
pub mod call_controls;
pub mod call_status;
pub mod dial_pad;
pub mod error_banner;
pub mod microphone_test;
pub mod title_banner;

pub use app::App;
pub use call_controls::CallControls;
pub use call_status::CallStatus;
pub use dial_pad::DialPad;
pub use error_banner::ErrorBanner;
pub use microphone_test::MicrophoneTest;
pub use title_banner::TitleBanner;
