use rand::prelude::Distribution;
use rand::Rng;
use std::collections::HashMap;
use texpand::command;
use texpand::token;
use texpand::vm;
use texpand_stdlib::expansion;
use texpand_stdlib::script;
use texpand_stdlib::StdLibState;

/// Run the input through Texpand and return the written output.
pub fn run_in_texpand(input: &str) -> String {
    run_with_built_ins(input, StdLibState::all_initial_built_ins())
}

/// Like [run_in_texpand], but `\expandafter` uses the simple implementation.
pub fn run_in_texpand_with_simple_expandafter(input: &str) -> String {
    let mut built_ins = StdLibState::all_initial_built_ins();
    built_ins.insert("expandafter", expansion::get_expandafter_simple());
    run_with_built_ins(input, built_ins)
}

fn run_with_built_ins(
    input: &str,
    built_ins: HashMap<&'static str, command::BuiltIn<StdLibState>>,
) -> String {
    let mut vm = vm::VM::<StdLibState>::new(built_ins);
    vm.push_source("benchmark.tex", input);
    match script::run(&mut vm, false) {
        Ok(output) => token::write_tokens(&output, vm.cs_name_interner()),
        Err(err) => panic!("benchmark input failed to run: {err}"),
    }
}

static RANDOM_CS_NAMES: [&str; 16] = [
    "def", "gdef", "let", "global", "long", "outer", "expandafter", "noexpand", "relax",
    "input", "endinput", "everyeof", "catcode", "namespace", "newline", "macro",
];

pub struct Weights {
    pub begin_group: u32,
    pub end_group: u32,
    pub parameter: u32,
    pub space: u32,
    pub comment: u32,
    pub letter: u32,
    pub other: u32,
    pub control_sequence: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            begin_group: 10,
            end_group: 10,
            parameter: 20,
            space: 20,
            comment: 5,
            letter: 200,
            other: 100,
            control_sequence: 100,
        }
    }
}

/// Generate a document that repeatedly redefines `\macro` with a random body.
///
/// Running the document produces no output, so it mostly measures the lexer
///     and the parsing of macro bodies.
pub fn generate_random_tex_document(
    rng: &mut rand::prelude::StdRng,
    num_lines: usize,
    macro_length_bounds: (usize, usize),
    line_length_bounds: (usize, usize),
    weights: &Weights,
) -> String {
    let mut result = String::new();
    result.push_str("% This document was randomly generated.\n");
    result.push_str("% Running the document is a no-op except that \\macro will be defined at the end.\n");

    let mut num_lines_generated: usize = 2;
    loop {
        let (min, max) = if macro_length_bounds.1 < macro_length_bounds.0 {
            (macro_length_bounds.1, macro_length_bounds.1)
        } else {
            macro_length_bounds
        };
        if num_lines_generated + min + 2 > num_lines {
            break;
        }
        let max = max.min(num_lines - num_lines_generated - 2);
        let macro_length = rng.gen_range(min..=max);
        result.push_str(&generate_random_tex_macro(
            rng,
            line_length_bounds,
            macro_length,
            weights,
        ));
        num_lines_generated += macro_length + 2;
    }
    result
}

pub fn generate_random_tex_macro(
    rng: &mut rand::prelude::StdRng,
    line_length_bounds: (usize, usize),
    num_lines: usize,
    weights: &Weights,
) -> String {
    let dist = match rand::distributions::WeightedIndex::new([
        weights.begin_group,
        weights.end_group,
        weights.parameter,
        weights.space,
        weights.comment,
        weights.letter,
        weights.other,
        weights.control_sequence,
    ]) {
        Ok(dist) => dist,
        Err(err) => panic!("invalid weights: {err}"),
    };

    let mut result = String::with_capacity(num_lines * line_length_bounds.1 + 100);
    result.push_str("\\def\\macro#1#2#3{\n");
    for _ in 0..num_lines {
        result.push_str("  ");
        let mut commenting = false;
        let mut group_depth: u32 = 0;
        let line_length = if line_length_bounds.1 <= line_length_bounds.0 {
            line_length_bounds.1
        } else {
            rng.gen_range(line_length_bounds.0..=line_length_bounds.1)
        };
        let mut i = 0;
        while i < line_length {
            let temp;
            let s = match dist.sample(rng) {
                0 => {
                    if !commenting {
                        group_depth += 1;
                    }
                    "{"
                }
                1 => {
                    if !commenting && group_depth == 0 {
                        continue;
                    }
                    if !commenting {
                        group_depth -= 1;
                    }
                    "}"
                }
                2 => match rng.gen_range(0..4) {
                    0 => "#1",
                    1 => "#2",
                    2 => "#3",
                    _ => "##",
                },
                3 => " ",
                4 => {
                    for _ in 0..group_depth {
                        result.push('}');
                    }
                    group_depth = 0;
                    commenting = true;
                    "%"
                }
                5 => {
                    let first = if rng.gen_range(0..4) == 0 { b'A' } else { b'a' };
                    temp = char::from(first + rng.gen_range(0..26)).to_string();
                    &temp
                }
                6 => match rng.gen_range(0..14) {
                    0 => "0",
                    1 => "1",
                    2 => "2",
                    3 => "3",
                    4 => "4",
                    5 => "5",
                    6 => "6",
                    7 => "7",
                    8 => "8",
                    9 => "9",
                    10 => ".",
                    11 => ",",
                    12 => ";",
                    _ => ":",
                },
                _ => {
                    temp = format![
                        "\\{} ",
                        RANDOM_CS_NAMES[rng.gen_range(0..RANDOM_CS_NAMES.len())]
                    ];
                    &temp
                }
            };
            i += s.len();
            result.push_str(s);
        }
        for _ in 0..group_depth {
            result.push('}');
        }
        result.push('\n');
    }
    result.push_str("}\n");
    result
}

const EXPANSION_PREAMBLE: &str = r"\def\swap#1#2{#2#1}%
\def\wrap#1{[#1]}%
\def\pair#1#2.{\swap{#2}{#1}}%
\long\def\twice#1{#1#1}%
\let\s\swap
";

/// Generate a document made of random calls to a few macros with parameters.
///
/// Every call produces output, so the document measures argument matching
///     and replacement.
pub fn generate_macro_calls(rng: &mut rand::prelude::StdRng, num_calls: usize) -> String {
    let mut result = String::from(EXPANSION_PREAMBLE);
    for _ in 0..num_calls {
        let a = char::from(b'a' + rng.gen_range(0..26));
        let b = char::from(b'a' + rng.gen_range(0..26));
        let call = match rng.gen_range(0..6) {
            0 => format![r"\swap {a}{b}"],
            1 => format![r"\wrap{{\swap {a}{b}}}"],
            2 => format![r"\pair {a}{b}."],
            3 => format![r"\expandafter\wrap\expandafter{{\s {a}{b}}}"],
            4 => format![r"\twice{{\wrap {a}}}"],
            _ => format![r"\noexpand\relax {a}"],
        };
        result.push_str(&call);
        if rng.gen_range(0..8) == 0 {
            result.push('\n');
        }
    }
    result.push('\n');
    result
}

/// Generate a chain of `\expandafter` commands that is `length` commands long.
///
/// The chain ends with a macro that expands to a single letter.
pub fn generate_expandafter_chain(length: usize) -> String {
    let mut result = String::from(r"\def\m{}\def\z{z}");
    for _ in 0..length {
        result.push_str(r"\expandafter\m");
    }
    result.push_str(r"\z");
    result
}
