use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::cards::{CardStore, PROJECTS, SKILLS_AND_EXPERIENCE};
use crate::{ToolArguments, ToolImplementation};
use folio_common::tools::{Parameters, Property, Tool};

const CARD_TITLE: &str = "card_title";

fn card_title_parameters() -> Parameters {
    Parameters::from_properties([(
        CARD_TITLE,
        Property::string("The exact title of the card."),
        true,
    )])
}

/// Lists every collection with card contents blanked.
pub struct GetCardsLayoutTool {
    store: Arc<dyn CardStore>,
}

impl GetCardsLayoutTool {
    pub fn new(store: Arc<dyn CardStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolImplementation for GetCardsLayoutTool {
    fn get_definition(&self) -> Tool {
        Tool::function(
            "get_cards_layout",
            "Returns the titles, order and expansion state of every card on the page, \
             grouped by collection. Card contents are not included.",
            Parameters::empty(),
        )
    }

    async fn execute(&self, _args: &ToolArguments) -> Result<String> {
        let mut layout = Map::new();
        for name in self.store.collection_names() {
            let collection = self.store.list_collection(&name)?;
            let cards = collection
                .cards
                .iter()
                .map(|card| serde_json::to_value(card.without_content()))
                .collect::<Result<Vec<_>, _>>()?;
            layout.insert(name, Value::Array(cards));
        }

        Ok(serde_json::to_string(&layout)?)
    }
}

/// Returns the full content of a card.
pub struct GetCardContentTool {
    store: Arc<dyn CardStore>,
}

impl GetCardContentTool {
    pub fn new(store: Arc<dyn CardStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolImplementation for GetCardContentTool {
    fn get_definition(&self) -> Tool {
        Tool::function(
            "get_card_content",
            "Returns the full text content of the card with the given title.",
            card_title_parameters(),
        )
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String> {
        let title = args.str(CARD_TITLE)?;
        Ok(self
            .store
            .find_card(title)
            .map_or_else(|| "Card not found.".to_string(), |card| card.content))
    }
}

fn set_expanded(store: &dyn CardStore, title: &str, expanded: bool) -> String {
    if store.update_card(title, &|card| card.is_expanded = expanded) {
        let verb = if expanded { "Expanded" } else { "Collapsed" };
        format!("{verb} card {title}.")
    } else {
        format!("Card {title} not found.")
    }
}

pub struct ExpandCardTool {
    store: Arc<dyn CardStore>,
}

impl ExpandCardTool {
    pub fn new(store: Arc<dyn CardStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolImplementation for ExpandCardTool {
    fn get_definition(&self) -> Tool {
        Tool::function(
            "expand_card",
            "Expands the card with the given title so its full content is visible.",
            card_title_parameters(),
        )
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String> {
        Ok(set_expanded(self.store.as_ref(), args.str(CARD_TITLE)?, true))
    }
}

pub struct CollapseCardTool {
    store: Arc<dyn CardStore>,
}

impl CollapseCardTool {
    pub fn new(store: Arc<dyn CardStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolImplementation for CollapseCardTool {
    fn get_definition(&self) -> Tool {
        Tool::function(
            "collapse_card",
            "Collapses the card with the given title so only its title is visible.",
            card_title_parameters(),
        )
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String> {
        Ok(set_expanded(self.store.as_ref(), args.str(CARD_TITLE)?, false))
    }
}

/// Reorders one collection; cards not named are hidden.
pub struct ReorderCardsTool {
    store: Arc<dyn CardStore>,
    collection: &'static str,
    name: &'static str,
    parameter: &'static str,
    description: &'static str,
}

impl ReorderCardsTool {
    pub fn projects(store: Arc<dyn CardStore>) -> Self {
        Self {
            store,
            collection: PROJECTS,
            name: "set_project_cards_order",
            parameter: "project_order",
            description: "Sets the order of the project cards. Only the projects listed are \
                          shown, in the order given. Listing every title keeps all projects visible.",
        }
    }

    pub fn skills_and_experience(store: Arc<dyn CardStore>) -> Self {
        Self {
            store,
            collection: SKILLS_AND_EXPERIENCE,
            name: "set_skills_and_experience_cards_order",
            parameter: "skills_and_experience_order",
            description: "Sets the order of the skills and experience cards. Only the cards \
                          listed are shown, in the order given.",
        }
    }
}

#[async_trait]
impl ToolImplementation for ReorderCardsTool {
    fn get_definition(&self) -> Tool {
        Tool::function(
            self.name,
            self.description,
            Parameters::from_properties([(
                self.parameter,
                Property::string_array("Card titles in the desired order."),
                true,
            )]),
        )
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String> {
        let titles = args.string_list(self.parameter)?;
        self.store.reorder_collection(self.collection, &titles)?;
        Ok("Done.".to_string())
    }
}
