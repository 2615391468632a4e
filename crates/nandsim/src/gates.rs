//! Gates derived from NAND.
//!
//! Each helper is made only of [`Circuit::nand`] calls, so its output lags
//! its inputs by one step per gate level. Internal wires are created on the
//! circuit.

use crate::circuit::Circuit;
use crate::wire::Wire;

impl Circuit {
    /// `out = !a`. One level.
    pub fn not(&mut self, a: &Wire, out: &Wire) {
        self.nand(a, a, out);
    }

    /// `out = a && b`. Two levels.
    pub fn and(&mut self, a: &Wire, b: &Wire, out: &Wire) {
        let n = self.wire();
        self.nand(a, b, &n);
        self.not(&n, out);
    }

    /// `out = a || b`. Two levels.
    pub fn or(&mut self, a: &Wire, b: &Wire, out: &Wire) {
        let (na, nb) = (self.wire(), self.wire());
        self.not(a, &na);
        self.not(b, &nb);
        self.nand(&na, &nb, out);
    }

    /// `out = a ^ b`. Three levels, four gates.
    pub fn xor(&mut self, a: &Wire, b: &Wire, out: &Wire) {
        let n = self.wire();
        self.nand(a, b, &n);
        let (p, q) = (self.wire(), self.wire());
        self.nand(a, &n, &p);
        self.nand(b, &n, &q);
        self.nand(&p, &q, out);
    }
}
