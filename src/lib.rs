//! PAL — a chat assistant that answers in channels, fetches audio from video
//! links and puts questions of judgement to a panel of LLM judges.

pub mod chat;
pub mod config;
pub mod console;
pub mod judgement;
pub mod llm;
pub mod media;
