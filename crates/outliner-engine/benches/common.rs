// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use outliner_engine::Block;

#[allow(dead_code)]
pub fn generate_block_content(size: usize) -> String {
    let base = "TODO [#A] Buy **oat** milk at [[Groceries]] and check ((block-ref)) with `code` #shopping ";
    base.repeat(size)
}

/// A page file with `sections` top-level blocks, each nested `depth` deep.
#[allow(dead_code)]
pub fn generate_page_file(sections: usize, depth: usize) -> String {
    let mut content = String::from("# Bench\ntags:: bench\n\n");
    for section in 0..sections {
        for level in 0..depth {
            let indent = "  ".repeat(level);
            content.push_str(&format!(
                "{indent}- Section {section} level {level} links [[Page {level}]]\n"
            ));
        }
    }
    content
}

/// `width` top-level blocks with `width` children each.
#[allow(dead_code)]
pub fn generate_blocks(width: usize) -> Vec<Block> {
    (0..width)
        .map(|i| {
            let children = (0..width)
                .map(|j| Block::new(format!("b{i}-{j}"), format!("child {j} of {i}")))
                .collect();
            Block::new(format!("b{i}"), format!("block {i}")).with_children(children)
        })
        .collect()
}
