//! Built-in circuits selectable from the command line.

use clap::ValueEnum;
use nandsim::{Circuit, Input, Output, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// One NAND gate: buttons `a`, `b`; bulb `out`.
    Nand,
    /// Four-NAND XOR: buttons `a`, `b`; bulb `out`.
    Xor,
    /// Buttons `a`, `b`; bulbs `sum`, `carry`.
    HalfAdder,
    /// Switches `in` (a b cin); lamps `out` (cout sum).
    FullAdder,
    /// Active-low SR latch: buttons `s`, `r` (start them at 1); bulbs `q`, `q_n`.
    SrLatch,
}

impl Demo {
    pub fn build(self) -> Result<Circuit, SimError> {
        let mut circuit = Circuit::new();
        match self {
            Demo::Nand => {
                let (a, b, out) = (circuit.wire(), circuit.wire(), circuit.wire());
                circuit.nand(&a, &b, &out);
                circuit.connect_input("a", Input::button(&a))?;
                circuit.connect_input("b", Input::button(&b))?;
                circuit.connect_output("out", Output::bulb(&out))?;
            }
            Demo::Xor => {
                let (a, b, out) = (circuit.wire(), circuit.wire(), circuit.wire());
                circuit.xor(&a, &b, &out);
                circuit.connect_input("a", Input::button(&a))?;
                circuit.connect_input("b", Input::button(&b))?;
                circuit.connect_output("out", Output::bulb(&out))?;
            }
            Demo::HalfAdder => {
                let (a, b) = (circuit.wire(), circuit.wire());
                let (sum, carry) = (circuit.wire(), circuit.wire());
                circuit.xor(&a, &b, &sum);
                circuit.and(&a, &b, &carry);
                circuit.connect_input("a", Input::button(&a))?;
                circuit.connect_input("b", Input::button(&b))?;
                circuit.connect_output("sum", Output::bulb(&sum))?;
                circuit.connect_output("carry", Output::bulb(&carry))?;
            }
            Demo::FullAdder => {
                let (a, b, cin) = (circuit.wire(), circuit.wire(), circuit.wire());
                let (partial, sum) = (circuit.wire(), circuit.wire());
                let (c1, c2, cout) = (circuit.wire(), circuit.wire(), circuit.wire());
                circuit.xor(&a, &b, &partial);
                circuit.xor(&partial, &cin, &sum);
                circuit.and(&a, &b, &c1);
                circuit.and(&partial, &cin, &c2);
                circuit.or(&c1, &c2, &cout);
                circuit.connect_input("in", Input::bits([a, b, cin]))?;
                circuit.connect_output("out", Output::bits([cout, sum]))?;
            }
            Demo::SrLatch => {
                let (s, r) = (circuit.wire(), circuit.wire());
                let (q, q_n) = (circuit.wire(), circuit.wire());
                circuit.nand(&s, &q_n, &q);
                circuit.nand(&r, &q, &q_n);
                circuit.connect_input("s", Input::button(&s))?;
                circuit.connect_input("r", Input::button(&r))?;
                circuit.connect_output("q", Output::bulb(&q))?;
                circuit.connect_output("q_n", Output::bulb(&q_n))?;
            }
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nandsim::Outcome;

    fn settle(circuit: &mut Circuit) {
        while circuit.pending_events() > 0 {
            circuit.step();
        }
    }

    fn reply(circuit: &mut Circuit, text: &str) -> String {
        match circuit.execute(text) {
            Outcome::Reply(reply) => reply,
            Outcome::Exit => panic!("unexpected exit for {text:?}"),
        }
    }

    #[test]
    fn every_demo_builds_and_settles() {
        for demo in Demo::value_variants() {
            let mut circuit = demo.build().unwrap();
            settle(&mut circuit);
            assert!(circuit.output_names().count() > 0, "{demo:?} has outputs");
        }
    }

    #[test]
    fn half_adder_truth_table() {
        let mut circuit = Demo::HalfAdder.build().unwrap();
        for (a, b, sum, carry) in [("0", "0", "0", "0"), ("0", "1", "1", "0"), ("1", "1", "0", "1")] {
            assert_eq!(reply(&mut circuit, &format!("set a {a}")), "set!");
            assert_eq!(reply(&mut circuit, &format!("set b {b}")), "set!");
            settle(&mut circuit);
            assert_eq!(reply(&mut circuit, "get sum"), sum);
            assert_eq!(reply(&mut circuit, "get carry"), carry);
        }
    }

    #[test]
    fn full_adder_takes_three_bit_input() {
        let mut circuit = Demo::FullAdder.build().unwrap();
        assert_eq!(
            reply(&mut circuit, "set in 1 1"),
            "incorrect number of values: want 3, got 2"
        );
        assert_eq!(reply(&mut circuit, "set in 1 1 1"), "set!");
        settle(&mut circuit);
        assert_eq!(reply(&mut circuit, "get out"), "11");
    }

    #[test]
    fn sr_latch_remembers_last_pulse() {
        let mut circuit = Demo::SrLatch.build().unwrap();
        settle(&mut circuit);
        for cmd in ["set r 1", "set s 1"] {
            reply(&mut circuit, cmd);
            settle(&mut circuit);
        }
        assert_eq!(reply(&mut circuit, "get q"), "1");

        for cmd in ["set r 0", "set r 1"] {
            reply(&mut circuit, cmd);
            settle(&mut circuit);
        }
        assert_eq!(reply(&mut circuit, "get q"), "0");
        assert_eq!(reply(&mut circuit, "get q_n"), "1");
    }
}
