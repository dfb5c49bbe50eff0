//! Locating blocks in the tree.
//!
//! A block lives either in the top-level list or in one column of a
//! multi-column block. Blocks carry no parent pointers; instead a search
//! returns a [`BlockContext`]: the path to the owning list plus the index
//! within it.

use crate::model::{Block, BlockId};

/// One descent from a list into a column: `blocks[block].columns[column]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnStep {
    pub block: usize,
    pub column: usize,
}

/// Address of a block list. Empty for the top-level list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPath(pub Vec<ColumnStep>);

impl ListPath {
    pub fn is_top_level(&self) -> bool {
        self.0.is_empty()
    }

    /// The list holding the multi-column block that owns this list, and that
    /// block's index in it.
    pub fn parent(&self) -> Option<(ListPath, usize)> {
        let (last, rest) = self.0.split_last()?;
        Some((ListPath(rest.to_vec()), last.block))
    }

    fn child(&self, block: usize, column: usize) -> ListPath {
        let mut steps = self.0.clone();
        steps.push(ColumnStep { block, column });
        ListPath(steps)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub list: ListPath,
    pub index: usize,
}

impl BlockContext {
    pub fn parent(&self) -> Option<(ListPath, usize)> {
        self.list.parent()
    }
}

/// Depth-first search for `id` across all column lists.
pub fn find(blocks: &[Block], id: &BlockId) -> Option<BlockContext> {
    search(blocks, id, &ListPath::default())
}

fn search(blocks: &[Block], id: &BlockId, path: &ListPath) -> Option<BlockContext> {
    for (index, block) in blocks.iter().enumerate() {
        if block.id() == id {
            return Some(BlockContext {
                list: path.clone(),
                index,
            });
        }
        for (column, col) in block.columns().unwrap_or_default().iter().enumerate() {
            if let Some(found) = search(&col.blocks, id, &path.child(index, column)) {
                return Some(found);
            }
        }
    }
    None
}

pub fn list<'a>(blocks: &'a [Block], path: &ListPath) -> Option<&'a [Block]> {
    let mut current = blocks;
    for step in &path.0 {
        current = current.get(step.block)?.columns()?.get(step.column)?.blocks.as_slice();
    }
    Some(current)
}

pub fn list_mut<'a>(blocks: &'a mut Vec<Block>, path: &ListPath) -> Option<&'a mut Vec<Block>> {
    let mut current = blocks;
    for step in &path.0 {
        current = &mut current
            .get_mut(step.block)?
            .columns_mut()?
            .get_mut(step.column)?
            .blocks;
    }
    Some(current)
}

pub fn block<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    let ctx = find(blocks, id)?;
    list(blocks, &ctx.list)?.get(ctx.index)
}

pub fn block_mut<'a>(blocks: &'a mut Vec<Block>, id: &BlockId) -> Option<&'a mut Block> {
    let ctx = find(blocks, id)?;
    list_mut(blocks, &ctx.list)?.get_mut(ctx.index)
}

/// Call `f` on every block, parents before the blocks in their columns.
pub fn visit_mut(blocks: &mut [Block], f: &mut dyn FnMut(&mut Block)) {
    for block in blocks {
        f(block);
        if let Some(columns) = block.columns_mut() {
            for column in columns {
                visit_mut(&mut column.blocks, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockInit, Column};
    use crate::registry::{BlockRegistry, BlockType};
    use pretty_assertions::assert_eq;

    fn p(id: &str) -> Block {
        Block::new(
            BlockInit::new(BlockType::Paragraph, id).id(id),
            &BlockRegistry::default(),
        )
    }

    fn tree() -> Vec<Block> {
        let reg = BlockRegistry::default();
        vec![
            p("a"),
            Block::new(
                BlockInit::new(BlockType::Columns, "").id("cols").columns(vec![
                    Column::new(vec![p("l1"), p("l2")]),
                    Column::new(vec![p("r1")]),
                ]),
                &reg,
            ),
            p("z"),
        ]
    }

    #[test]
    fn finds_top_level_and_nested_blocks() {
        let blocks = tree();
        assert_eq!(
            find(&blocks, &BlockId::new("z")),
            Some(BlockContext {
                list: ListPath::default(),
                index: 2
            })
        );

        let ctx = find(&blocks, &BlockId::new("r1")).unwrap();
        assert_eq!(ctx.list.0, vec![ColumnStep { block: 1, column: 1 }]);
        assert_eq!(ctx.index, 0);
        assert_eq!(ctx.parent(), Some((ListPath::default(), 1)));

        assert_eq!(find(&blocks, &BlockId::new("missing")), None);
    }

    #[test]
    fn resolves_lists_by_path() {
        let mut blocks = tree();
        let ctx = find(&blocks, &BlockId::new("l2")).unwrap();
        let ids: Vec<&str> = list(&blocks, &ctx.list)
            .unwrap()
            .iter()
            .map(|b| b.id().as_str())
            .collect();
        assert_eq!(ids, vec!["l1", "l2"]);

        list_mut(&mut blocks, &ctx.list).unwrap().remove(0);
        assert_eq!(find(&blocks, &BlockId::new("l2")).unwrap().index, 0);
        assert!(block_mut(&mut blocks, &BlockId::new("l2")).is_some());
        assert!(block(&blocks, &BlockId::new("l1")).is_none());
    }
}
