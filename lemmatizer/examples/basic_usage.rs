//! Basic usage examples for pretree and lemmatizer.

use lemmatizer::{Lemmatizer, PosLemmatizer};
use pretree::rule::{apply_rule, create_rule};
use pretree::{LookupMode, Pretree, SharedPretree};

const VERBS: &[(&str, &str)] = &[
    ("walked", "walk"),
    ("talked", "talk"),
    ("jumped", "jump"),
    ("running", "run"),
    ("sitting", "sit"),
];

const NOUNS: &[(&str, &str)] = &[("houses", "house"), ("mice", "mouse"), ("cats", "cat")];

fn main() {
    example_classifier();
    example_rules();
    example_lemmatizer();
    example_shared();
}

fn suffix_tree(pairs: &[(&str, &str)]) -> Pretree {
    let mut tree = Pretree::new();
    tree.set_reverse(true);
    for &(full, base) in pairs {
        tree.train(full, &create_rule(full, base), 1).unwrap();
    }
    tree
}

fn example_classifier() {
    println!("=== Pretree (Classifier) ===\n");

    let mut tree = Pretree::new();
    tree.train("apple", "fruit", 3).unwrap();
    tree.train("apricot", "fruit", 1).unwrap();
    tree.train("asparagus", "vegetable", 2).unwrap();

    println!("applesauce  -> {}", tree.classify("applesauce"));
    println!("asp         -> {}", tree.classify("asp"));
    println!("P(fruit|ap) =  {:.2}", tree.probability_for_class("ap", "fruit"));
    println!("exact 'apple': {:?}", tree.get("apple", LookupMode::Exact).unwrap());

    tree.freeze().unwrap();
    println!("frozen: {} chars, {} nodes", tree.flat().unwrap().len(), tree.node_count().unwrap());
    println!("{}", tree.explain("apricots").unwrap());
}

fn example_rules() {
    println!("=== Rule Codes ===\n");

    for (full, base) in [("running", "run"), ("Häuser", "Haus"), ("gesungen", "singen")] {
        let rule = create_rule(full, base);
        println!("{full} -> {base}: {rule:?} applies as {:?}", apply_rule(full, &rule).unwrap());
    }
    println!();
}

fn example_lemmatizer() {
    println!("=== Lemmatizer ===\n");

    let mut verbs = suffix_tree(VERBS);
    verbs.prune().unwrap();
    let verbs = Lemmatizer::new(verbs);
    for word in ["stalked", "knitting", "went"] {
        println!("{word} -> {}", verbs.lemmatize(word));
    }

    let pos = PosLemmatizer::new(vec![
        ("NN".to_string(), Lemmatizer::new(suffix_tree(NOUNS))),
        ("VB".to_string(), verbs),
    ]);
    for (word, tag) in [("houses", "NNS"), ("talked", "VBD"), ("talked", "JJ")] {
        println!("{word}/{tag} -> {}", pos.lemmatize_word(word, tag));
    }
    println!();
}

fn example_shared() {
    println!("=== SharedPretree (Thread-Safe Wrapper) ===\n");

    let shared = SharedPretree::from(suffix_tree(VERBS));
    std::thread::scope(|s| {
        s.spawn(|| shared.train("hopped", &create_rule("hopped", "hop"), 1).unwrap());
        s.spawn(|| println!("walked -> {}", shared.classify("walked")));
    });
    println!("total count: {}", shared.read(|t| t.total_count().unwrap()));
}
