//! Input and output devices: named bundles of wires with a text encoding.
//!
//! An [`Input`] turns command text into wire values; an [`Output`] turns wire
//! values into display text and announces when any of its wires change.

use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::error::{CommandError, DeviceError};
use crate::notifier::Notifier;
use crate::wire::Wire;

/// Wire list of a device. Most devices drive a handful of lines.
pub type Wires = SmallVec<[Wire; 4]>;

type DecodeRule = dyn Fn(&str) -> Result<Vec<bool>, DeviceError>;
type EncodeRule = dyn Fn(&[bool]) -> Result<String, DeviceError>;

// ============================================================================
// Input
// ============================================================================

/// An input device that sets the values of one or more wires.
#[derive(Clone)]
pub struct Input {
    wires: Wires,
    decode: Rc<DecodeRule>,
}

impl Input {
    /// Construct an input over `wires`.
    ///
    /// `decode` turns command text into one boolean per wire. Producing the
    /// wrong number of values is not a decode error; the circuit reports it
    /// as an arity mismatch.
    pub fn new(
        wires: impl IntoIterator<Item = Wire>,
        decode: impl Fn(&str) -> Result<Vec<bool>, DeviceError> + 'static,
    ) -> Self {
        Self {
            wires: wires.into_iter().collect(),
            decode: Rc::new(decode),
        }
    }

    /// A button that's either pressed (anything but `0`) or not (`0`).
    pub fn button(wire: &Wire) -> Self {
        Self::new([wire.clone()], |value| Ok(vec![value != "0"]))
    }

    /// A bank of switches set from a string of `0`/`1` characters, one per
    /// wire, in wire order. Whitespace is ignored.
    pub fn bits(wires: impl IntoIterator<Item = Wire>) -> Self {
        Self::new(wires, parse_bits)
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn width(&self) -> usize {
        self.wires.len()
    }

    pub fn decode(&self, text: &str) -> Result<Vec<bool>, DeviceError> {
        (self.decode)(text)
    }

    /// Decode `text` and write the result straight onto the wires.
    ///
    /// Nothing is written unless decoding succeeds with exactly one value
    /// per wire.
    pub fn apply(&self, text: &str) -> Result<(), CommandError> {
        let values = self.decode(text)?;
        if values.len() != self.wires.len() {
            return Err(CommandError::Arity {
                want: self.wires.len(),
                got: values.len(),
            });
        }
        for (wire, value) in self.wires.iter().zip(values) {
            wire.set(value);
        }
        Ok(())
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input").field("wires", &self.wires).finish()
    }
}

fn parse_bits(text: &str) -> Result<Vec<bool>, DeviceError> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(DeviceError::decode(format!("invalid bit '{other}'"))),
        })
        .collect()
}

// ============================================================================
// Output
// ============================================================================

struct OutputInner {
    wires: Wires,
    encode: Box<EncodeRule>,
    changed: Rc<Notifier<()>>,
}

/// An output device that responds to changes in one or more wires.
///
/// Clones share the same device.
#[derive(Clone)]
pub struct Output {
    inner: Rc<OutputInner>,
}

impl Output {
    /// Construct an output over `wires`.
    ///
    /// `encode` receives one boolean per wire, in wire order, and renders the
    /// text shown to the user.
    pub fn new(
        wires: impl IntoIterator<Item = Wire>,
        encode: impl Fn(&[bool]) -> Result<String, DeviceError> + 'static,
    ) -> Self {
        let wires: Wires = wires.into_iter().collect();
        let changed = Rc::new(Notifier::new());
        for wire in &wires {
            let changed = changed.clone();
            wire.on_update(move |_| changed.publish(&()));
        }
        Self {
            inner: Rc::new(OutputInner {
                wires,
                encode: Box::new(encode),
                changed,
            }),
        }
    }

    /// A bulb that's either on (`1`) or off (`0`).
    pub fn bulb(wire: &Wire) -> Self {
        Self::new([wire.clone()], |bits| match bits {
            [bit] => Ok(render_bit(*bit).to_string()),
            _ => Err(DeviceError::encode("expected exactly 1 value")),
        })
    }

    /// A row of lamps rendered as a `0`/`1` string in wire order.
    pub fn bits(wires: impl IntoIterator<Item = Wire>) -> Self {
        Self::new(wires, |bits| Ok(bits.iter().copied().map(render_bit).collect()))
    }

    pub fn wires(&self) -> &[Wire] {
        &self.inner.wires
    }

    /// Encode the current wire values.
    pub fn value(&self) -> Result<String, DeviceError> {
        let bits: SmallVec<[bool; 8]> = self.inner.wires.iter().map(Wire::value).collect();
        (self.inner.encode)(&bits)
    }

    /// Call `listener` every time one of this output's wires changes.
    ///
    /// Unlike [`Wire::on_update`], there is no initial call.
    pub fn on_change(&self, listener: impl Fn() + 'static) {
        self.inner.changed.subscribe(move |_| listener());
    }

    pub(crate) fn downgrade(&self) -> WeakOutput {
        WeakOutput(Rc::downgrade(&self.inner))
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("wires", &self.inner.wires)
            .finish()
    }
}

pub(crate) struct WeakOutput(Weak<OutputInner>);

impl WeakOutput {
    pub(crate) fn upgrade(&self) -> Option<Output> {
        self.0.upgrade().map(|inner| Output { inner })
    }
}

fn render_bit(bit: bool) -> char {
    if bit {
        '1'
    } else {
        '0'
    }
}
