//! Per-execution search records.
//!
//! A record drives one search item through the images it can produce. The two
//! strategies, [`SingularRecord`] and [`MultipleRecord`], implement the shared
//! state machine; item kinds only supply a probe that knows how to find,
//! write and erase their images.
//!
//! Every record distinguishes three kinds of re-entry:
//! - `next` produces the following image, or `false` once the round is over;
//! - `repeat` prepares to replay the images of the current round, because the
//!   positions the item depends on did not change;
//! - `reset` forgets the round, so the next call searches afresh.

use crate::error::SearchError;
use crate::state::State;

pub(crate) trait Record<'g> {
    /// Advance to the next image. `false` ends the round; the record is then
    /// ready to replay it.
    fn next(&mut self, state: &mut State<'g>) -> Result<bool, SearchError>;

    /// Erase the current image, if any, and prepare to replay the round.
    fn repeat(&mut self, state: &mut State<'g>);

    /// Erase the current image, if any, and start a fresh round on the next call.
    fn reset(&mut self, state: &mut State<'g>);

    /// Whether the current round produced no image at all.
    fn is_empty(&self) -> bool;

    /// Whether at most one image exists per round.
    fn is_singular(&self) -> bool;
}

/// Writing and erasing the images of one item kind.
pub(crate) trait Probe<'g> {
    type Image: Clone;

    /// Write `image` into the state. On `false` the state is unchanged.
    fn write(&mut self, state: &mut State<'g>, image: &Self::Image) -> Result<bool, SearchError>;

    /// Undo a successful `write` of `image`.
    fn erase(&mut self, state: &mut State<'g>, image: &Self::Image);
}

/// A probe with at most one image per round.
pub(crate) trait SingularProbe<'g>: Probe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<Self::Image>, SearchError>;
}

/// A probe enumerating candidate images; `write` filters them.
pub(crate) trait MultipleProbe<'g>: Probe<'g> {
    /// The images to try this round, advanced lazily by the record.
    fn candidates(&mut self, state: &State<'g>) -> Result<Box<dyn Iterator<Item = Self::Image> + 'g>, SearchError>;
}

enum SingularState<I> {
    Start,
    Empty,
    /// The image is written.
    Found(I),
    /// The image was consumed; the next call writes it again.
    Full(I),
}

pub(crate) struct SingularRecord<P, I> {
    probe: P,
    state: SingularState<I>,
}

impl<P, I> SingularRecord<P, I> {
    pub(crate) fn new(probe: P) -> Self {
        Self {
            probe,
            state: SingularState::Start,
        }
    }
}

impl<'g, P, I> Record<'g> for SingularRecord<P, I>
where
    P: SingularProbe<'g, Image = I>,
    I: Clone,
{
    fn next(&mut self, state: &mut State<'g>) -> Result<bool, SearchError> {
        match std::mem::replace(&mut self.state, SingularState::Start) {
            SingularState::Start => match self.probe.find(state)? {
                Some(image) if self.probe.write(state, &image)? => {
                    self.state = SingularState::Found(image);
                    Ok(true)
                }
                _ => {
                    self.state = SingularState::Empty;
                    Ok(false)
                }
            },
            SingularState::Found(image) => {
                self.probe.erase(state, &image);
                self.state = SingularState::Full(image);
                Ok(false)
            }
            SingularState::Full(image) => {
                let written = self.probe.write(state, &image)?;
                self.state = if written {
                    SingularState::Found(image)
                } else {
                    SingularState::Full(image)
                };
                Ok(written)
            }
            SingularState::Empty => {
                self.state = SingularState::Empty;
                Ok(false)
            }
        }
    }

    fn repeat(&mut self, state: &mut State<'g>) {
        if let SingularState::Found(image) = &self.state {
            let image = image.clone();
            self.probe.erase(state, &image);
            self.state = SingularState::Full(image);
        }
    }

    fn reset(&mut self, state: &mut State<'g>) {
        if let SingularState::Found(image) = std::mem::replace(&mut self.state, SingularState::Start) {
            self.probe.erase(state, &image);
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self.state, SingularState::Empty)
    }

    fn is_singular(&self) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MultipleState {
    /// No round in progress.
    Start,
    /// The round produced nothing.
    Empty,
    /// Holding the latest image of a round still being enumerated.
    Part,
    /// Replay pending; the enumeration is unfinished.
    PartStart,
    /// Replaying emitted image `k`; the enumeration is unfinished.
    PartRepeat(usize),
    /// Replay pending; every image of the round is known.
    FullStart,
    /// Replaying emitted image `k`; every image of the round is known.
    FullRepeat(usize),
}

pub(crate) struct MultipleRecord<'g, P, I> {
    probe: P,
    state: MultipleState,
    // The enumeration of the current round, dropped once it runs dry.
    source: Option<Box<dyn Iterator<Item = I> + 'g>>,
    // Images written successfully this round, in order.
    emitted: Vec<I>,
}

impl<P, I> MultipleRecord<'_, P, I> {
    pub(crate) fn new(probe: P) -> Self {
        Self {
            probe,
            state: MultipleState::Start,
            source: None,
            emitted: Vec::new(),
        }
    }
}

impl<'g, P, I> MultipleRecord<'g, P, I>
where
    P: MultipleProbe<'g, Image = I>,
    I: Clone,
{
    /// Continue the enumeration of the round.
    fn advance(&mut self, state: &mut State<'g>) -> Result<bool, SearchError> {
        if let Some(source) = self.source.as_mut() {
            for image in source.by_ref() {
                if self.probe.write(state, &image)? {
                    self.emitted.push(image);
                    self.state = MultipleState::Part;
                    return Ok(true);
                }
            }
        }
        self.source = None;
        self.state = if self.emitted.is_empty() {
            MultipleState::Empty
        } else {
            MultipleState::FullStart
        };
        Ok(false)
    }

    /// Replay emitted images from position `from`; falls through to the
    /// enumeration when the round is unfinished.
    fn replay(&mut self, state: &mut State<'g>, from: usize, full: bool) -> Result<bool, SearchError> {
        for k in from..self.emitted.len() {
            if self.probe.write(state, &self.emitted[k])? {
                self.state = if full {
                    MultipleState::FullRepeat(k)
                } else {
                    MultipleState::PartRepeat(k)
                };
                return Ok(true);
            }
        }
        if full {
            self.state = MultipleState::FullStart;
            Ok(false)
        } else {
            self.advance(state)
        }
    }

    /// Erase the held image, if any.
    fn erase_current(&mut self, state: &mut State<'g>) {
        let held = match self.state {
            MultipleState::Part => self.emitted.len().checked_sub(1),
            MultipleState::PartRepeat(k) | MultipleState::FullRepeat(k) => Some(k),
            _ => None,
        };
        if let Some(k) = held {
            self.probe.erase(state, &self.emitted[k]);
        }
    }
}

impl<'g, P, I> Record<'g> for MultipleRecord<'g, P, I>
where
    P: MultipleProbe<'g, Image = I>,
    I: Clone,
{
    fn next(&mut self, state: &mut State<'g>) -> Result<bool, SearchError> {
        match self.state {
            MultipleState::Start => {
                self.source = Some(self.probe.candidates(state)?);
                self.emitted.clear();
                self.advance(state)
            }
            MultipleState::Empty => Ok(false),
            MultipleState::Part => {
                self.erase_current(state);
                self.advance(state)
            }
            MultipleState::PartStart => self.replay(state, 0, false),
            MultipleState::PartRepeat(k) => {
                self.erase_current(state);
                self.replay(state, k + 1, false)
            }
            MultipleState::FullStart => self.replay(state, 0, true),
            MultipleState::FullRepeat(k) => {
                self.erase_current(state);
                self.replay(state, k + 1, true)
            }
        }
    }

    fn repeat(&mut self, state: &mut State<'g>) {
        self.erase_current(state);
        self.state = match self.state {
            MultipleState::Part | MultipleState::PartRepeat(_) => MultipleState::PartStart,
            MultipleState::FullRepeat(_) => MultipleState::FullStart,
            other => other,
        };
    }

    fn reset(&mut self, state: &mut State<'g>) {
        self.erase_current(state);
        self.state = MultipleState::Start;
        self.source = None;
        self.emitted.clear();
    }

    fn is_empty(&self) -> bool {
        self.state == MultipleState::Empty
    }

    fn is_singular(&self) -> bool {
        false
    }
}
