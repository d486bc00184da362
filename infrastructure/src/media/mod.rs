//! Local persistence of binary reply output.

pub mod audio_sink;

pub use audio_sink::{AudioSink, FileAudioSink, NoAudioSink};
