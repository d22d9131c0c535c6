use crate::context::TxContext;
use crate::id::ObjectId;
use crate::objects::LedgerObject;
use serde::{Deserialize, Serialize};

/// An RGB triple held on the ledger.
///
/// Deliberately neither `Clone` nor `Copy`: the only way to get rid of a
/// `ColorObject` is to hand it back to the ledger or call [`ColorObject::delete`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorObject {
    id: ObjectId,
    red: u8,
    green: u8,
    blue: u8,
}

impl ColorObject {
    /// Create a new object with a fresh identity from `ctx`
    pub fn new(red: u8, green: u8, blue: u8, ctx: &mut TxContext) -> Self {
        Self {
            id: ctx.allocate_identity(),
            red,
            green,
            blue,
        }
    }

    /// Returns `(red, green, blue)`
    pub fn get_color(&self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    /// Overwrite the fields of `into` with those of `from`. Identities are untouched.
    pub fn copy_into(from: &ColorObject, into: &mut ColorObject) {
        if from.id == into.id {
            return;
        }
        into.red = from.red;
        into.green = from.green;
        into.blue = from.blue;
    }

    pub fn update(&mut self, red: u8, green: u8, blue: u8) {
        self.red = red;
        self.green = green;
        self.blue = blue;
    }

    /// Destroy the object and retire its identity
    pub fn delete(self, ctx: &mut TxContext) {
        let ColorObject { id, .. } = self;
        ctx.release_identity(id);
    }
}

impl LedgerObject for ColorObject {
    const TYPE_TAG: &'static str = "color_object::ColorObject";

    fn id(&self) -> &ObjectId {
        &self.id
    }
}
