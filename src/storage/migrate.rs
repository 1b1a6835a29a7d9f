//! Upgrades for records written by older journal versions
//!
//! Older trades may lack a `uid` or carry screenshots without a recorded
//! filename. Both are filled in deterministically when the trade is loaded.

use crate::models::image::{extension_for_mime, DEFAULT_MIME};
use crate::models::{ImageSlot, InlineImage, Trade, TradeUid};

/// Bring a trade up to the current record shape, returning whether it changed
pub fn upgrade_trade(trade: &mut Trade) -> bool {
    let mut changed = false;

    if trade.uid.is_blank() {
        trade.uid = TradeUid::legacy(trade.id);
        changed = true;
    }

    for slot in [ImageSlot::Entry, ImageSlot::Exit] {
        let Some(reference) = trade.image(slot) else {
            continue;
        };
        if trade.image_name(slot).is_some() {
            continue;
        }

        let extension = match InlineImage::from_data_uri(reference) {
            Ok(image) => image.extension(),
            Err(_) => extension_for_mime(DEFAULT_MIME),
        };
        let name = slot.file_name(&trade.uid, extension);
        let reference = reference.to_string();
        trade.set_image(slot, Some(reference), Some(name));
        changed = true;
    }

    changed
}
