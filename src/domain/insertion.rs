//! Splicing content blocks into the document and re-basing pending points.

use tracing::{debug, warn};

use crate::domain::AppError;
use crate::domain::content::ContentBlock;
use crate::domain::document::{DocumentModel, RenderableBlock};
use crate::domain::insertion_point::InsertionPoint;

/// Applies resolved content to one insertion point at a time.
pub struct InsertionEngine;

impl InsertionEngine {
    /// Insert `blocks` after the anchor of `points[point_idx]`, mark the point
    /// filled and shift every later unfilled point by the number of blocks
    /// inserted. Returns that number.
    ///
    /// A block that cannot be spliced is logged and left out of the point's
    /// content; the remaining blocks still go in. Block failures never unfill
    /// the point: even when every block fails it is marked filled with zero
    /// inserted blocks. Callers skip empty content before calling.
    pub fn apply(
        model: &mut DocumentModel,
        points: &mut [InsertionPoint],
        point_idx: usize,
        blocks: Vec<ContentBlock>,
    ) -> Result<usize, AppError> {
        let count = points.len();
        let point = points
            .get_mut(point_idx)
            .ok_or(AppError::OutOfRange { index: point_idx, count })?;
        if point.filled {
            warn!(anchor = point.anchor_index, "insertion point already filled, skipping");
            return Ok(0);
        }

        let anchor = point.anchor_index;
        let mut cursor = anchor;
        let mut applied = Vec::with_capacity(blocks.len());
        for block in blocks {
            match splice_block(model, cursor, &block) {
                Ok(Some(inserted)) => {
                    cursor += inserted;
                    applied.push(block);
                }
                Ok(None) => {}
                Err(err) => warn!(anchor, kind = block.kind(), error = %err, "skipping block"),
            }
        }

        if applied.is_empty() {
            warn!(anchor, "no content could be inserted");
        }

        let inserted = cursor - anchor;
        point.filled = true;
        point.inserted_block_count = inserted;
        point.content = applied;

        rebase(points, point_idx, anchor, inserted);
        Ok(inserted)
    }
}

/// Shift unfilled points anchored after `anchor` by `inserted`, except the one just filled.
pub fn rebase(points: &mut [InsertionPoint], filled_idx: usize, anchor: usize, inserted: usize) {
    for (idx, point) in points.iter_mut().enumerate() {
        if idx != filled_idx && !point.filled && point.anchor_index > anchor {
            debug!(from = point.anchor_index, to = point.anchor_index + inserted, "re-basing point");
            point.anchor_index += inserted;
        }
    }
}

/// Splice one content block after `cursor`. `None` means the block was skipped.
fn splice_block(
    model: &mut DocumentModel,
    cursor: usize,
    block: &ContentBlock,
) -> Result<Option<usize>, AppError> {
    let renderables = match block {
        ContentBlock::Text { body } => vec![RenderableBlock::text(body.as_str())],
        ContentBlock::Code { body, .. } => body.split('\n').map(RenderableBlock::code_line).collect(),
        ContentBlock::Table { headers, rows } => {
            vec![RenderableBlock::Table { headers: headers.clone(), rows: rows.clone() }]
        }
        ContentBlock::Image { path, width_hint } => {
            if !path.is_file() {
                debug!(path = %path.display(), "image missing, skipping");
                return Ok(None);
            }
            vec![RenderableBlock::Image { path: path.clone(), width_inches: *width_hint }]
        }
    };
    model.splice_after(cursor, renderables).map(Some)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use proptest::prelude::*;

    use super::*;
    use crate::domain::document::BlockKind;
    use crate::testing::docx_fixture;

    fn numbered_model(count: usize) -> DocumentModel {
        let texts: Vec<String> = (0..count).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        DocumentModel::from_bytes(docx_fixture::docx_bytes(&refs)).unwrap()
    }

    fn texts(count: usize) -> Vec<ContentBlock> {
        (0..count).map(|i| ContentBlock::text(format!("new {i}"))).collect()
    }

    #[test]
    fn single_text_block_is_inserted_after_anchor() {
        let mut model = numbered_model(10);
        let mut points = vec![InsertionPoint::new(4, "question")];

        let inserted =
            InsertionEngine::apply(&mut model, &mut points, 0, vec![ContentBlock::text("答案是42。")])
                .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(model.block_count(), 11);
        assert_eq!(model.text_of(4).unwrap(), "p4");
        assert_eq!(model.text_of(5).unwrap(), "答案是42。");
        assert!(points[0].filled);
        assert_eq!(points[0].inserted_block_count, 1);
        assert_eq!(points[0].content, vec![ContentBlock::text("答案是42。")]);
    }

    #[test]
    fn later_points_are_rebased_after_each_fill() {
        let mut model = numbered_model(12);
        let mut points = vec![InsertionPoint::new(4, "first"), InsertionPoint::new(8, "second")];

        InsertionEngine::apply(&mut model, &mut points, 0, texts(3)).unwrap();
        assert_eq!(points[1].anchor_index, 11);
        assert_eq!(model.text_of(11).unwrap(), "p8");

        InsertionEngine::apply(&mut model, &mut points, 1, vec![ContentBlock::text("after p8")])
            .unwrap();
        assert_eq!(model.text_of(12).unwrap(), "after p8");
        assert_eq!(points[0].anchor_index, 4);
    }

    #[test]
    fn earlier_and_filled_points_are_not_moved() {
        let mut points = vec![
            InsertionPoint::new(2, "earlier"),
            InsertionPoint::new(5, "filled"),
            InsertionPoint::new(5, "same anchor"),
            InsertionPoint::new(9, "later"),
        ];
        points[1].filled = true;
        rebase(&mut points, 1, 5, 4);
        let anchors: Vec<usize> = points.iter().map(|p| p.anchor_index).collect();
        assert_eq!(anchors, vec![2, 5, 5, 13]);
    }

    #[test]
    fn code_becomes_one_block_per_line() {
        let mut model = numbered_model(3);
        let mut points = vec![InsertionPoint::new(0, "code")];

        let inserted = InsertionEngine::apply(
            &mut model,
            &mut points,
            0,
            vec![ContentBlock::code("c", "int a;\n\nint b;")],
        )
        .unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(model.text_of(1).unwrap(), "int a;");
        assert_eq!(model.text_of(2).unwrap(), "");
        assert_eq!(model.text_of(3).unwrap(), "int b;");
        assert_eq!(model.text_of(4).unwrap(), "p1");
    }

    #[test]
    fn table_counts_as_one_unit() {
        let mut model = numbered_model(2);
        let mut points = vec![InsertionPoint::new(0, "table"), InsertionPoint::new(1, "next")];
        let table = ContentBlock::Table {
            headers: Some(vec!["A".into(), "B".into()]),
            rows: vec![vec!["1".into(), "2".into()], vec!["3".into(), "".into()]],
        };

        let inserted = InsertionEngine::apply(&mut model, &mut points, 0, vec![table]).unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(model.kind_of(1).unwrap(), BlockKind::Table);
        assert_eq!(points[1].anchor_index, 2);
    }

    #[test]
    fn missing_image_is_skipped_but_point_still_filled() {
        let mut model = numbered_model(2);
        let mut points = vec![InsertionPoint::new(0, "chart")];
        let blocks = vec![
            ContentBlock::Image { path: PathBuf::from("/nonexistent/chart.png"), width_hint: 5.0 },
            ContentBlock::code("python", "plt.plot()"),
        ];

        let inserted = InsertionEngine::apply(&mut model, &mut points, 0, blocks).unwrap();

        assert_eq!(inserted, 1);
        assert!(points[0].filled);
        assert_eq!(points[0].content, vec![ContentBlock::code("python", "plt.plot()")]);
    }

    #[test]
    fn point_is_filled_even_when_every_block_fails() {
        let mut model = numbered_model(3);
        let mut points = vec![InsertionPoint::new(0, "chart"), InsertionPoint::new(2, "later")];
        let blocks = vec![ContentBlock::Image {
            path: PathBuf::from("/nonexistent/chart.png"),
            width_hint: 5.0,
        }];

        let inserted = InsertionEngine::apply(&mut model, &mut points, 0, blocks).unwrap();

        assert_eq!(inserted, 0);
        assert!(points[0].filled);
        assert_eq!(points[0].inserted_block_count, 0);
        assert!(points[0].content.is_empty());
        assert_eq!(points[1].anchor_index, 2);
        assert_eq!(model.block_count(), 3);
    }

    #[test]
    fn malformed_image_is_omitted_from_content() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("chart.svg");
        fs::write(&bogus, "<svg/>").unwrap();

        let mut model = numbered_model(1);
        let mut points = vec![InsertionPoint::new(0, "chart")];
        let blocks = vec![
            ContentBlock::text("intro"),
            ContentBlock::Image { path: bogus, width_hint: 5.0 },
            ContentBlock::text("outro"),
        ];

        let inserted = InsertionEngine::apply(&mut model, &mut points, 0, blocks).unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(points[0].content, vec![ContentBlock::text("intro"), ContentBlock::text("outro")]);
        assert_eq!(model.text_of(2).unwrap(), "outro");
    }

    #[test]
    fn image_on_disk_is_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let chart = dir.path().join("chart.png");
        fs::write(&chart, docx_fixture::png_header(640, 480)).unwrap();

        let mut model = numbered_model(1);
        let mut points = vec![InsertionPoint::new(0, "chart")];
        let inserted = InsertionEngine::apply(
            &mut model,
            &mut points,
            0,
            vec![ContentBlock::Image { path: chart, width_hint: 5.0 }],
        )
        .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(model.block_count(), 2);
    }

    #[test]
    fn already_filled_point_is_left_alone() {
        let mut model = numbered_model(3);
        let mut points = vec![InsertionPoint::new(1, "done")];
        points[0].filled = true;
        assert_eq!(InsertionEngine::apply(&mut model, &mut points, 0, texts(2)).unwrap(), 0);
        assert_eq!(model.block_count(), 3);
    }

    #[test]
    fn unknown_point_index_is_out_of_range() {
        let mut model = numbered_model(1);
        let mut points: Vec<InsertionPoint> = Vec::new();
        let err = InsertionEngine::apply(&mut model, &mut points, 0, texts(1)).unwrap_err();
        assert!(matches!(err, AppError::OutOfRange { index: 0, count: 0 }));
    }

    #[test]
    fn anchor_past_end_appends_in_order() {
        let mut model = numbered_model(2);
        let mut points = vec![InsertionPoint::new(7, "tail")];
        InsertionEngine::apply(&mut model, &mut points, 0, texts(2)).unwrap();
        assert_eq!(model.text_of(2).unwrap(), "new 0");
        assert_eq!(model.text_of(3).unwrap(), "new 1");
    }

    fn fill_plan() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<usize>)> {
        (4usize..24).prop_flat_map(|doc_len| {
            proptest::collection::btree_set(0..doc_len, 1..6).prop_flat_map(move |anchors| {
                let anchors: Vec<usize> = anchors.into_iter().collect();
                let count = anchors.len();
                let sizes = proptest::collection::vec(1usize..5, count);
                let order = Just((0..count).collect::<Vec<usize>>()).prop_shuffle();
                (Just(doc_len), Just(anchors), sizes, order).prop_map(
                    |(doc_len, anchors, sizes, order)| {
                        (doc_len, anchors.into_iter().zip(sizes).collect(), order)
                    },
                )
            })
        })
    }

    proptest! {
        #[test]
        fn anchors_track_original_blocks((doc_len, plan, order) in fill_plan(), fills in 0usize..6) {
            let mut model = numbered_model(doc_len);
            let mut points: Vec<InsertionPoint> =
                plan.iter().map(|(anchor, _)| InsertionPoint::new(*anchor, "p")).collect();
            let originals: Vec<usize> = plan.iter().map(|(anchor, _)| *anchor).collect();

            for &idx in order.iter().take(fills) {
                // The anchor must still address the block it was located on.
                let expected = format!("p{}", originals[idx]);
                prop_assert_eq!(model.text_of(points[idx].anchor_index).unwrap(), expected.as_str());

                let inserted = InsertionEngine::apply(&mut model, &mut points, idx, texts(plan[idx].1)).unwrap();
                prop_assert_eq!(inserted, plan[idx].1);
            }

            for (idx, point) in points.iter().enumerate().filter(|(_, p)| !p.filled) {
                let shift: usize = points
                    .iter()
                    .zip(&originals)
                    .filter(|(other, original)| other.filled && **original < originals[idx])
                    .map(|(other, _)| other.inserted_block_count)
                    .sum();
                prop_assert_eq!(point.anchor_index, originals[idx] + shift);
            }
        }
    }
}
