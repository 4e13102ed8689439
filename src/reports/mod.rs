use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use stenoforge::biphoneme::{PositionalStats, MAX_POSITION};
use stenoforge::keyboard::{Finger, Hand, Keyboard};
use stenoforge::keymap::Keymap;
use stenoforge::ordering::CanonicalOrder;
use stenoforge::phonology::PositionGroup;
use stenoforge::scorer::ScoreReport;
use stenoforge::theory::AmbiguityStats;
use strum::IntoEnumIterator;

fn right_align(table: &mut Table, from: usize, to: usize) {
    for i in from..=to {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn print_order_report(order: &CanonicalOrder) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Group").add_attribute(Attribute::Bold),
        Cell::new("Order"),
        Cell::new("Ordered").fg(Color::Green),
        Cell::new("Disordered").fg(Color::Red),
        Cell::new("Kept %").add_attribute(Attribute::Bold),
    ]);

    for group in PositionGroup::ALL {
        let r = order.result(group);
        let total = r.total_score();
        let kept = if total > 0.0 {
            100.0 * r.ordered_score / total
        } else {
            100.0
        };
        table.add_row(vec![
            Cell::new(group.to_string()),
            Cell::new(r.permutation.join(" ")),
            Cell::new(format!("{:.1}", r.ordered_score)),
            Cell::new(format!("{:.1}", r.disordered_score)),
            Cell::new(format!("{:.2}", kept)),
        ]);
    }
    right_align(&mut table, 2, 4);
    println!("\n=== CANONICAL ORDER ===");
    println!("{}", table);

    let mut pairs = Table::new();
    pairs.load_preset(ASCII_FULL);
    pairs.add_row(vec![
        Cell::new("Group").add_attribute(Attribute::Bold),
        Cell::new("Pair"),
        Cell::new("Lost").fg(Color::Red),
    ]);
    for group in PositionGroup::ALL {
        for p in order.result(group).disordered_pairs.iter().take(5) {
            pairs.add_row(vec![
                Cell::new(group.to_string()),
                Cell::new(format!("{}{}", p.first, p.second)),
                Cell::new(format!("{:.1}", p.frequency)),
            ]);
        }
    }
    right_align(&mut pairs, 2, 2);
    println!("\nHeaviest pairs typed against the order:");
    println!("{}", pairs);
}

pub fn print_positional(stats: &PositionalStats) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Phoneme").add_attribute(Attribute::Bold)];
    for i in 0..MAX_POSITION {
        header.push(Cell::new(format!("+{}", i + 1)).fg(Color::Green));
    }
    for i in 0..MAX_POSITION {
        header.push(Cell::new(format!("-{}", i + 1)).fg(Color::Red));
    }
    table.add_row(header);

    for (p, start) in &stats.from_start {
        let end = stats.from_end.get(p).copied().unwrap_or([0.0; MAX_POSITION]);
        let total: f64 = start.iter().sum();
        let share = |v: f64| {
            if total > 0.0 {
                format!("{:.1}", 100.0 * v / total)
            } else {
                "-".to_string()
            }
        };
        let mut row = vec![Cell::new(p).set_alignment(CellAlignment::Center)];
        row.extend(start.iter().map(|&v| Cell::new(share(v))));
        row.extend(end.iter().map(|&v| Cell::new(share(v))));
        table.add_row(row);
    }
    right_align(&mut table, 1, 2 * MAX_POSITION);
    println!("\n=== SYLLABLE POSITIONS (% from start / from end) ===");
    println!("{}", table);
}

pub fn print_score_report(results: &[(String, f64, ScoreReport)]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Keymap").add_attribute(Attribute::Bold),
        Cell::new("Fitness").fg(Color::Cyan),
        Cell::new("Cover %"),
        Cell::new("Keys"),
        Cell::new("Chords"),
        Cell::new("Strain"),
        Cell::new("Peak"),
        Cell::new("Multi"),
        Cell::new("Var"),
        Cell::new("Exc"),
        Cell::new("Disord %").fg(Color::Red),
        Cell::new("Misread"),
        Cell::new("Ambig").fg(Color::Red),
    ]);

    for (name, fitness, r) in results {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.4}", fitness)).fg(Color::Cyan),
            Cell::new(format!("{:.2}", 100.0 * r.coverage())),
            Cell::new(format!("{:.3}", r.avg_keystrokes)),
            Cell::new(format!("{:.3}", r.avg_chords)),
            Cell::new(format!("{:.3}", r.avg_strain)),
            Cell::new(format!("{:.3}", r.peak_finger_share)),
            Cell::new(r.multi_representation_count),
            Cell::new(r.variation_count),
            Cell::new(r.exception_count),
            Cell::new(format!("{:.2}", 100.0 * r.out_of_order_ratio())),
            Cell::new(format!("{:.1}", r.misread_mass)),
            Cell::new(format!("{:.1}", r.ambiguity.ambiguity_mass)),
        ]);
    }
    right_align(&mut table, 1, 12);
    println!("\n=== STRAIN REPORT ===");
    println!("{}", table);
}

pub fn print_coverage(report: &ScoreReport) {
    println!(
        "Words: {} total | {} covered ({:.1}) | {} uncovered ({:.1}) | {} unusable ({:.1})",
        report.total_words,
        report.covered_words,
        report.covered_mass,
        report.uncovered_words,
        report.uncovered_mass,
        report.unusable_words,
        report.unusable_mass
    );
    if !report.uncovered_examples.is_empty() {
        let list: Vec<String> = report
            .uncovered_examples
            .iter()
            .map(|w| format!("{} /{}/", w.ortho, w.pronunciation))
            .collect();
        println!("⚠️  Most frequent uncovered: {}", list.join(", "));
    }
}

pub fn print_finger_load(report: &ScoreReport) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    let mut header = vec![Cell::new("Finger").add_attribute(Attribute::Bold)];
    let mut row = vec![Cell::new("Load %")];
    for f in Finger::iter() {
        header.push(Cell::new(f.to_string()));
        let share = 100.0 * report.finger_load[f.index()];
        let cell = Cell::new(format!("{:.1}", share));
        row.push(if share > 20.0 { cell.fg(Color::Red) } else { cell });
    }
    table.add_row(header);
    table.add_row(row);
    right_align(&mut table, 1, Finger::COUNT);
    println!("{}", table);

    let left: f64 = Finger::iter()
        .filter(|f| f.hand() == Hand::Left)
        .map(|f| report.finger_load[f.index()])
        .sum();
    println!(
        "Hands: left {:.1}% | right {:.1}%",
        100.0 * left,
        100.0 * (1.0 - left)
    );
}

pub fn print_keymap(keymap: &Keymap, keyboard: &Keyboard) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![
        Cell::new("Group").add_attribute(Attribute::Bold),
        Cell::new("Phoneme"),
        Cell::new("Chords"),
    ]);
    for ((group, phonemes), chords) in keymap.entries() {
        let labels: Vec<String> = chords
            .iter()
            .map(|c| {
                let label = keyboard.chord_label(*c);
                if keymap.is_shared(*group, *c) {
                    format!("{}*", label)
                } else {
                    label
                }
            })
            .collect();
        table.add_row(vec![
            Cell::new(group.to_string()),
            Cell::new(phonemes.concat()).set_alignment(CellAlignment::Center),
            Cell::new(labels.join(" | ")),
        ]);
    }
    println!("{}", table);
}

pub fn print_ambiguity(stats: &AmbiguityStats) {
    println!(
        "Ambiguous sequences: {} | lost frequency {:.1} | worst: {} words ({})",
        stats.ambiguous_sequences,
        stats.ambiguity_mass,
        stats.max_ambiguity,
        stats.max_ambiguity_words.join(", ")
    );
    if !stats.heaviest_words.is_empty() {
        println!(
            "Heaviest ambiguity ({:.1}): {}",
            stats.heaviest_mass,
            stats.heaviest_words.join(", ")
        );
    }
    if stats.same_lemma_sequences > 0 {
        println!(
            "Same-lemma homophones: {} sequences ({:.1} needing a discriminator)",
            stats.same_lemma_sequences, stats.same_lemma_mass
        );
    }
}

pub fn print_mental_strain(report: &ScoreReport) {
    println!(
        "Exceptions: {} costly of {} applied ({} declared, {} unused) | {} out of order",
        report.exception_count,
        report.applied_exceptions,
        report.declared_exceptions,
        report.unused_exceptions(),
        report.out_of_order_exceptions
    );
    if report.variation_examples.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.add_row(vec![
        Cell::new("Syllable").add_attribute(Attribute::Bold),
        Cell::new("Patterns"),
        Cell::new("Spellings"),
        Cell::new("Freq"),
    ]);
    for v in &report.variation_examples {
        table.add_row(vec![
            Cell::new(&v.syllable),
            Cell::new(v.patterns),
            Cell::new(v.spellings.join(", ")),
            Cell::new(format!("{:.1}", v.frequency)),
        ]);
    }
    right_align(&mut table, 1, 1);
    right_align(&mut table, 3, 3);
    println!("{}", table);
}
