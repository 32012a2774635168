//! Sound cues with per-channel mute. Fire-and-forget; nothing waits on playback.

use log::debug;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Voice on every new snake.
    Ahh,
    /// Impact when a snake lands.
    Ouch,
    /// Background loop and end tune.
    Music,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    GameStart,
    Spawn,
    Land,
    GameOver,
}

impl Cue {
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Self::GameStart => &[Channel::Music, Channel::Ahh],
            Self::Spawn => &[Channel::Ahh],
            Self::Land => &[Channel::Ouch],
            Self::GameOver => &[Channel::Music],
        }
    }
}

/// Terminal stand-in for the sound player: tracks mutes and the music loop,
/// logs cues, and optionally rings the bell on impacts.
#[derive(Debug, Default)]
pub struct Jukebox {
    muted_ahh: bool,
    muted_ouch: bool,
    muted_music: bool,
    bell: bool,
    looping: bool,
}

impl Jukebox {
    pub fn new(bell: bool) -> Self {
        Self {
            bell,
            ..Self::default()
        }
    }

    pub fn is_muted(&self, channel: Channel) -> bool {
        match channel {
            Channel::Ahh => self.muted_ahh,
            Channel::Ouch => self.muted_ouch,
            Channel::Music => self.muted_music,
        }
    }

    pub fn toggle(&mut self, channel: Channel) {
        let flag = match channel {
            Channel::Ahh => &mut self.muted_ahh,
            Channel::Ouch => &mut self.muted_ouch,
            Channel::Music => &mut self.muted_music,
        };
        *flag = !*flag;
        debug!("{channel:?} muted: {}", *flag);
    }

    /// True while the background loop is running (muted or not).
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Cues that play on at least one unmuted channel.
    pub fn play(&mut self, cue: Cue) -> bool {
        match cue {
            Cue::GameStart => self.looping = true,
            Cue::GameOver => self.looping = false,
            Cue::Spawn | Cue::Land => {}
        }
        let audible = cue.channels().iter().any(|&c| !self.is_muted(c));
        debug!("cue {cue:?} audible={audible}");
        if audible && self.bell && cue == Cue::Land {
            let mut out = std::io::stdout();
            let _ = out.write_all(b"\x07").and_then(|()| out.flush());
        }
        audible
    }
}
