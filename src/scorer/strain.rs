use crate::keyboard::{Chord, Finger, Keyboard};

/// Frequency-weighted physical effort over the covered words.
#[derive(Debug, Clone, Default)]
pub struct StrainTally {
    pub keystrokes: f64,
    pub chords: f64,
    pub strain: f64,
    pub finger_mass: [f64; Finger::COUNT],
}

impl StrainTally {
    pub fn add(&mut self, keyboard: &Keyboard, chords: &[Chord], frequency: f64, surcharge: f64) {
        self.chords += chords.len() as f64 * frequency;
        for &chord in chords {
            self.keystrokes += chord.len() as f64 * frequency;
            self.strain += keyboard.chord_strain(chord, surcharge) * frequency;
            let presses = keyboard.finger_presses(chord);
            for (f, &n) in presses.iter().enumerate() {
                self.finger_mass[f] += n as f64 * frequency;
            }
        }
    }

    /// Share of all key presses taken by each finger.
    pub fn finger_load(&self) -> [f64; Finger::COUNT] {
        let total: f64 = self.finger_mass.iter().sum();
        let mut load = [0.0; Finger::COUNT];
        if total > 0.0 {
            for (l, m) in load.iter_mut().zip(self.finger_mass.iter()) {
                *l = m / total;
            }
        }
        load
    }

    pub fn peak_finger_share(&self) -> f64 {
        self.finger_load().iter().copied().fold(0.0, f64::max)
    }
}
