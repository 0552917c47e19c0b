use arena_avl::AvlTreeMap;

fn main() {
    // Order words by length, then alphabetically
    let mut map = AvlTreeMap::with_comparator(|a: &&str, b: &&str| {
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    });
    for word in ["pear", "fig", "banana", "kiwi", "apple"] {
        map.insert(word, word.len());
    }

    println!("In-order traversal:");
    for (k, v) in &map {
        println!("Key: {}, Value: {}", k, v);
    }
}
