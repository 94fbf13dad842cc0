#![forbid(unsafe_code)]
//! `reelsmith` assembles a narrated short video from a script: each line becomes timed speech,
//! gets a background visual fitted to exactly that duration and optional sound effects, and the
//! resulting scenes are crossfaded into one timeline with background music and encoded to MP4.
//!
//! Collaborators that talk to the outside world sit behind traits ([`SpeechBackend`],
//! [`AssetProvider`], [`ImageGenerator`], [`FrameSink`]) so runs can be driven entirely in
//! memory.

pub mod assets;
pub mod audio;
pub mod compose;
pub mod encode;
pub mod foundation;
pub mod pipeline;
pub mod render;
pub mod script;
pub mod visual;
pub mod voice;

pub use audio::master::{MasteringChain, MasteringConfig};
pub use audio::segment::AudioSegment;
pub use audio::sfx::{Effect, MatchMode, SfxConfig, SfxPlacement, SfxPlacer};
pub use compose::scene::{Scene, SceneComposer};
pub use compose::timeline::{Timeline, TimelineAssembler, TimelineConfig, TransitionMode};
pub use encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use encode::sink::{Frame, FrameSink, InMemorySink};
pub use foundation::core::{Fps, FrameIndex, FrameSize, Orientation};
pub use foundation::error::{ReelError, ReelResult};
pub use pipeline::config::PipelineConfig;
pub use pipeline::run::{LineReport, LineStatus, Pipeline, RunReport};
pub use render::session::{RenderOpts, RenderStats, render_timeline};
pub use script::model::{Line, Script};
pub use visual::asset::{VisualAsset, VisualOrigin};
pub use visual::generate::{ImageGenerator, ProceduralImageGenerator};
pub use visual::provider::{AssetProvider, Candidate, LocalLibraryProvider, NoProvider};
pub use visual::resolver::{VisualConfig, VisualResolver};
pub use voice::backend::{CommandSpeechBackend, SharedSpeech, SpeechBackend, SpeechRequest};
pub use voice::profile::{ProfileTable, StyleTag, VoiceProfile};
pub use voice::synth::VoiceSynthesizer;
