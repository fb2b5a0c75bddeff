//! Notation components: leaves, tuplets, containers and voices
//!
//! The component tree is a plain owned tree. A `Component` is a closed enum
//! over leaves, tuplets and containers; rewrite commands match on it
//! exhaustively and mutate it in place. Ties and beams are indicators stored
//! on leaves:
//!
//! - `tie` on a leaf ties it to the next leaf in the flattened leaf order
//! - `repeat_tie` on a leaf ties it back to the previous leaf
//! - `start_beam` / `stop_beam` open and close a beam
//!
//! Queries that need neighbours (logical ties, smart unbeaming) work on the
//! flattened leaf sequence by index rather than on parent pointers.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::duration::{self, Duration};
use super::tag::Tag;

// ============================================================================
// Leaves
// ============================================================================

/// Kind of leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafKind {
    Note,
    Rest,
    Skip,
    MultimeasureRest,
}

/// Direction a feathered beam grows in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowDirection {
    Left,
    Right,
}

/// Explicit beam counts at a span-beam boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamCount {
    pub left: u32,
    pub right: u32,
}

/// Indicators attached to a leaf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicators {
    pub tie: bool,
    pub repeat_tie: bool,
    pub start_beam: bool,
    pub stop_beam: bool,
    pub beam_count: Option<BeamCount>,
    pub beam_grow_direction: Option<GrowDirection>,
    /// Printed in white, with a deactivated command that hides it outright
    #[serde(default)]
    pub invisible: bool,
}

impl Indicators {
    /// Remove beam start, stop and count
    pub fn detach_beams(&mut self) {
        self.start_beam = false;
        self.stop_beam = false;
        self.beam_count = None;
    }
}

/// Nonreduced duration multiplier ("dmp") such as `1/4` or `2/4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multiplier {
    pub numerator: i64,
    pub denominator: i64,
}

impl Multiplier {
    pub fn new(numerator: i64, denominator: i64) -> Self {
        debug_assert!(denominator > 0);
        Self {
            numerator,
            denominator,
        }
    }

    /// Reduced value of the multiplier
    pub fn value(&self) -> Duration {
        duration::duration(self.numerator, self.denominator)
    }

    /// Multiplier with the value of `value`, kept reduced
    pub fn from_duration(value: Duration) -> Self {
        Self::new(*value.numer(), *value.denom())
    }
}

/// A note, rest or skip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    pub kind: LeafKind,
    pub written_duration: Duration,
    pub multiplier: Option<Multiplier>,
    pub indicators: Indicators,
    pub tag: Tag,
}

impl Leaf {
    pub fn new(kind: LeafKind, written_duration: Duration) -> Self {
        Self {
            kind,
            written_duration,
            multiplier: None,
            indicators: Indicators::default(),
            tag: Tag::default(),
        }
    }

    pub fn note(written_duration: Duration) -> Self {
        Self::new(LeafKind::Note, written_duration)
    }

    pub fn rest(written_duration: Duration) -> Self {
        Self::new(LeafKind::Rest, written_duration)
    }

    pub fn skip(written_duration: Duration) -> Self {
        Self::new(LeafKind::Skip, written_duration)
    }

    pub fn with_multiplier(mut self, multiplier: Multiplier) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// Preprolated duration: written duration times multiplier
    pub fn duration(&self) -> Duration {
        match self.multiplier {
            Some(multiplier) => self.written_duration * multiplier.value(),
            None => self.written_duration,
        }
    }

    /// Notes are the only leaves that take ties
    pub fn is_pleaf(&self) -> bool {
        self.kind == LeafKind::Note
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.kind, LeafKind::Rest | LeafKind::MultimeasureRest)
    }
}

// ============================================================================
// Tuplets
// ============================================================================

/// Tuplet ratio `numerator:denominator`, read "numerator in the time of denominator"
///
/// A 3:2 tuplet has multiplier 2/3. The ratio is kept nonreduced so that
/// e.g. 8:6 can be distinguished from 4:3 in notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupletRatio {
    pub numerator: i64,
    pub denominator: i64,
}

impl TupletRatio {
    pub fn new(numerator: i64, denominator: i64) -> Self {
        debug_assert!(numerator > 0 && denominator > 0);
        Self {
            numerator,
            denominator,
        }
    }

    pub fn trivial() -> Self {
        Self::new(1, 1)
    }

    /// Ratio whose multiplier equals `multiplier`, in lowest terms
    pub fn from_multiplier(multiplier: Duration) -> Self {
        Self::new(*multiplier.denom(), *multiplier.numer())
    }

    pub fn multiplier(&self) -> Duration {
        duration::duration(self.denominator, self.numerator)
    }

    pub fn is_trivial(&self) -> bool {
        self.numerator == self.denominator
    }

    /// Multiplier greater than one
    pub fn is_augmented(&self) -> bool {
        self.numerator < self.denominator
    }

    /// Multiplier less than one
    pub fn is_diminished(&self) -> bool {
        self.denominator < self.numerator
    }

    /// Multiplier strictly between 1/2 and 2
    pub fn is_normalized(&self) -> bool {
        let multiplier = self.multiplier();
        duration::duration(1, 2) < multiplier && multiplier < Duration::from_integer(2)
    }

    /// True when the reduced ratio's denominator is a power of two: 3:2
    /// is dyadic, 4:3 is not
    pub fn is_dyadic(&self) -> bool {
        duration::is_positive_power_of_two(self.reduced().denominator)
    }

    pub fn reduced(&self) -> Self {
        Self::from_multiplier(self.multiplier())
    }

    /// Ratio with twice the multiplier, keeping the numerator when possible
    fn doubled(&self) -> Self {
        if self.numerator % 2 == 0 {
            Self::new(self.numerator / 2, self.denominator)
        } else {
            Self::new(self.numerator, self.denominator * 2)
        }
    }

    /// Ratio with half the multiplier, keeping the numerator when possible
    fn halved(&self) -> Self {
        if self.denominator % 2 == 0 {
            Self::new(self.numerator, self.denominator / 2)
        } else {
            Self::new(self.numerator * 2, self.denominator)
        }
    }
}

/// How a tuplet's bracket and number are drawn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TupletNotation {
    /// Bracket and number not drawn at all
    pub hide: bool,
    /// Number drawn as the full ratio, `3:2` rather than `3`
    pub fraction_text: bool,
    /// Number replaced by the tuplet's duration written as a rhythm
    pub duration_markup: bool,
}

/// Tuplet: a ratio applied to a list of components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuplet {
    pub ratio: TupletRatio,
    pub components: Vec<Component>,
    /// Accelerando/ritardando container drawn with feathered beams
    pub feather_beam: bool,
    #[serde(default)]
    pub notation: TupletNotation,
    pub tag: Tag,
}

impl Tuplet {
    pub fn new(ratio: TupletRatio, components: Vec<Component>) -> Self {
        Self {
            ratio,
            components,
            feather_beam: false,
            notation: TupletNotation::default(),
            tag: Tag::default(),
        }
    }

    /// 1:1 tuplet around `components`
    pub fn trivial(components: Vec<Component>) -> Self {
        Self::new(TupletRatio::trivial(), components)
    }

    /// Tuplet whose contents are scaled to last exactly `target`
    pub fn from_duration(target: Duration, components: Vec<Component>) -> Self {
        let contents = sum_durations(&components);
        debug_assert!(contents > duration::zero());
        Self::new(TupletRatio::from_multiplier(target / contents), components)
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    pub fn multiplier(&self) -> Duration {
        self.ratio.multiplier()
    }

    /// Duration of the contents before prolation
    pub fn contents_duration(&self) -> Duration {
        sum_durations(&self.components)
    }

    pub fn duration(&self) -> Duration {
        self.multiplier() * self.contents_duration()
    }

    pub fn leaves(&self) -> Vec<&Leaf> {
        leaves(&self.components)
    }

    pub fn leaves_mut(&mut self) -> Vec<&mut Leaf> {
        leaves_mut(&mut self.components)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Ratio reduces to 1:1
    pub fn is_trivial(&self) -> bool {
        self.ratio.is_trivial()
    }

    /// Every direct child is a rest
    pub fn is_rest_filled(&self) -> bool {
        !self.components.is_empty()
            && self
                .components
                .iter()
                .all(|c| matches!(c, Component::Leaf(leaf) if leaf.is_rest()))
    }

    /// Every direct child is a skip
    pub fn is_skip_filled(&self) -> bool {
        !self.components.is_empty()
            && self
                .components
                .iter()
                .all(|c| matches!(c, Component::Leaf(leaf) if leaf.kind == LeafKind::Skip))
    }

    /// True when every leaf would still be assignable at ratio 1:1
    pub fn is_trivializable(&self) -> bool {
        let multiplier = self.multiplier();
        self.leaves()
            .iter()
            .all(|leaf| duration::is_assignable(leaf.written_duration * multiplier))
    }

    /// Rewrite to 1:1 when the leaves permit it
    pub fn trivialize(&mut self) {
        if self.is_trivial() || !self.is_trivializable() {
            return;
        }
        let multiplier = self.multiplier();
        for leaf in self.leaves_mut() {
            leaf.written_duration *= multiplier;
        }
        self.ratio = TupletRatio::trivial();
    }

    /// Rescale written durations by a power of two so 1/2 < multiplier < 2
    pub fn normalize_ratio(&mut self) {
        if self.ratio.is_normalized() {
            return;
        }
        let multiplier = self.multiplier();
        let one = Duration::from_integer(1);
        let exponent = if multiplier >= one {
            floor_log2(multiplier)
        } else {
            -floor_log2(multiplier.recip())
        };
        let leaf_multiplier = if exponent >= 0 {
            Duration::from_integer(1 << exponent)
        } else {
            duration::duration(1, 1 << -exponent)
        };
        for leaf in self.leaves_mut() {
            leaf.written_duration *= leaf_multiplier;
        }
        self.ratio = TupletRatio::from_multiplier(multiplier / leaf_multiplier);
    }

    /// Change diminution into augmentation and vice versa
    ///
    /// A diminished tuplet doubles its multiplier (halving written durations)
    /// until it is no longer diminished; any other tuplet halves its
    /// multiplier until it is diminished.
    pub fn toggle_prolation(&mut self) {
        let two = Duration::from_integer(2);
        if self.ratio.is_diminished() {
            while self.ratio.is_diminished() {
                self.ratio = self.ratio.doubled();
                for leaf in self.leaves_mut() {
                    leaf.written_duration /= two;
                }
            }
        } else {
            while !self.ratio.is_diminished() {
                self.ratio = self.ratio.halved();
                for leaf in self.leaves_mut() {
                    leaf.written_duration *= two;
                }
            }
        }
    }
}

/// Exponent of the greatest power of two not greater than `value` (>= 1)
fn floor_log2(value: Duration) -> i64 {
    let mut exponent = 0;
    let mut power = Duration::from_integer(2);
    while power <= value {
        power *= 2;
        exponent += 1;
    }
    exponent
}

// ============================================================================
// Containers, components, voices
// ============================================================================

/// Unprolated container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub components: Vec<Component>,
    pub tag: Tag,
}

impl Container {
    pub fn new(components: Vec<Component>) -> Self {
        Self {
            components,
            tag: Tag::default(),
        }
    }
}

/// Any node of the notation tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    Leaf(Leaf),
    Tuplet(Tuplet),
    Container(Container),
}

impl Component {
    pub fn duration(&self) -> Duration {
        match self {
            Component::Leaf(leaf) => leaf.duration(),
            Component::Tuplet(tuplet) => tuplet.duration(),
            Component::Container(container) => sum_durations(&container.components),
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Component::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_tuplet(&self) -> Option<&Tuplet> {
        match self {
            Component::Tuplet(tuplet) => Some(tuplet),
            _ => None,
        }
    }
}

impl From<Leaf> for Component {
    fn from(leaf: Leaf) -> Self {
        Component::Leaf(leaf)
    }
}

impl From<Tuplet> for Component {
    fn from(tuplet: Tuplet) -> Self {
        Component::Tuplet(tuplet)
    }
}

impl From<Container> for Component {
    fn from(container: Container) -> Self {
        Component::Container(container)
    }
}

/// Named voice holding a flat list of components
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub components: Vec<Component>,
}

impl Voice {
    pub fn new<S: Into<String>>(name: S, components: Vec<Component>) -> Self {
        Self {
            name: name.into(),
            components,
        }
    }

    pub fn duration(&self) -> Duration {
        sum_durations(&self.components)
    }

    pub fn leaves(&self) -> Vec<&Leaf> {
        leaves(&self.components)
    }

    pub fn leaves_mut(&mut self) -> Vec<&mut Leaf> {
        leaves_mut(&mut self.components)
    }
}

// ============================================================================
// Music trait: uniform leaf/duration access over component kinds
// ============================================================================

/// Anything that has a duration and leaves
pub trait Music {
    fn duration(&self) -> Duration;
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>);
    fn collect_leaves_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Leaf>);
    /// Push the sounding duration of each leaf under `prolation`
    fn collect_prolated(&self, prolation: Duration, out: &mut Vec<Duration>);
}

impl Music for Leaf {
    fn duration(&self) -> Duration {
        Leaf::duration(self)
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        out.push(self);
    }

    fn collect_leaves_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Leaf>) {
        out.push(self);
    }

    fn collect_prolated(&self, prolation: Duration, out: &mut Vec<Duration>) {
        out.push(Leaf::duration(self) * prolation);
    }
}

impl Music for Tuplet {
    fn duration(&self) -> Duration {
        Tuplet::duration(self)
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        for component in &self.components {
            component.collect_leaves(out);
        }
    }

    fn collect_leaves_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Leaf>) {
        for component in self.components.iter_mut() {
            component.collect_leaves_mut(out);
        }
    }

    fn collect_prolated(&self, prolation: Duration, out: &mut Vec<Duration>) {
        let prolation = prolation * self.multiplier();
        for component in &self.components {
            component.collect_prolated(prolation, out);
        }
    }
}

impl Music for Component {
    fn duration(&self) -> Duration {
        Component::duration(self)
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            Component::Leaf(leaf) => out.push(leaf),
            Component::Tuplet(tuplet) => tuplet.collect_leaves(out),
            Component::Container(container) => {
                for component in &container.components {
                    component.collect_leaves(out);
                }
            }
        }
    }

    fn collect_leaves_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Leaf>) {
        match self {
            Component::Leaf(leaf) => out.push(leaf),
            Component::Tuplet(tuplet) => tuplet.collect_leaves_mut(out),
            Component::Container(container) => {
                for component in container.components.iter_mut() {
                    component.collect_leaves_mut(out);
                }
            }
        }
    }

    fn collect_prolated(&self, prolation: Duration, out: &mut Vec<Duration>) {
        match self {
            Component::Leaf(leaf) => leaf.collect_prolated(prolation, out),
            Component::Tuplet(tuplet) => tuplet.collect_prolated(prolation, out),
            Component::Container(container) => {
                for component in &container.components {
                    component.collect_prolated(prolation, out);
                }
            }
        }
    }
}

/// Leaves of `items` in score order
pub fn leaves<M: Music>(items: &[M]) -> Vec<&Leaf> {
    let mut out = Vec::new();
    for item in items {
        item.collect_leaves(&mut out);
    }
    out
}

/// Mutable leaves of `items` in score order
pub fn leaves_mut<M: Music>(items: &mut [M]) -> Vec<&mut Leaf> {
    let mut out = Vec::new();
    for item in items.iter_mut() {
        item.collect_leaves_mut(&mut out);
    }
    out
}

/// Sounding duration of each leaf of `items`, tuplet prolation included
pub fn prolated_durations<M: Music>(items: &[M]) -> Vec<Duration> {
    let mut out = Vec::new();
    for item in items {
        item.collect_prolated(duration::duration(1, 1), &mut out);
    }
    out
}

/// Total duration of `items`
pub fn sum_durations<M: Music>(items: &[M]) -> Duration {
    duration::sum(items.iter().map(|item| item.duration()))
}

// ============================================================================
// Logical ties
// ============================================================================

/// True when leaf `left` is tied to the leaf `right` that follows it
pub fn is_tied(left: &Leaf, right: &Leaf) -> bool {
    left.is_pleaf() && right.is_pleaf() && (left.indicators.tie || right.indicators.repeat_tie)
}

/// Index ranges of the logical ties of a flat leaf sequence
///
/// A logical tie is a maximal run of notes joined by ties or repeat ties;
/// every rest or skip is a logical tie of its own.
pub fn logical_ties(leaves: &[&Leaf]) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut start = 0;
    for i in 0..leaves.len() {
        let continues = i + 1 < leaves.len() && is_tied(leaves[i], leaves[i + 1]);
        if !continues {
            result.push(start..i + 1);
            start = i + 1;
        }
    }
    result
}

/// Number of logical ties in `items`
pub fn logical_tie_count<M: Music>(items: &[M]) -> usize {
    logical_ties(&leaves(items)).len()
}
