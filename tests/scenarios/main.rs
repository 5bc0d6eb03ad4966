mod dragging;
mod harness;
mod opening;
mod refreshing;
