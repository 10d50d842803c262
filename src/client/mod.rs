pub mod api;
pub mod live;
pub mod upload;

pub use api::ProxyClient;
pub use live::{AudioSink, DirectoryFrames, FileAudioSink, FrameSource, HttpSpeech, LiveSession, Speech};
pub use upload::UploadClip;
