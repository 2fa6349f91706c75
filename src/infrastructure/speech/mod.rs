pub mod remote;

pub use remote::RemoteSpeechToText;
