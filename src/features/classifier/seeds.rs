//! Built-in training examples, always part of every training run

use super::model::TrainingExample;
use super::IntentLabel::{self, Media, Other, Reminder};

const SEED_EXAMPLES: &[(&str, IntentLabel)] = &[
    ("Remind me to pick up the kids in 45 minutes", Reminder),
    ("Remind me to turn in my homework at midnight", Reminder),
    ("Remind me to call mom at 3pm.", Reminder),
    ("Remind me to pick up some milk later.", Reminder),
    ("Remind us to study for the final exam next week.", Reminder),
    ("remind me to fix my essay in an hour.", Reminder),
    ("remind me to throw my shoes away in three days.", Reminder),
    ("Remind me to feed the dog at 6pm.", Reminder),
    ("Remind me to check my email after dinner.", Reminder),
    ("Remind me to take my medicine at 8am.", Reminder),
    ("Remind me to water the plants tomorrow morning.", Reminder),
    ("Remind me to book a doctor's appointment next Monday.", Reminder),
    ("Remind me to charge my phone.", Reminder),
    ("Remind me to finish my online course this weekend.", Reminder),
    ("Remind me to call the plumber tomorrow.", Reminder),
    ("Remind me to renew my driver's license next month.", Reminder),
    ("Remind me to buy groceries on the way home.", Reminder),
    ("Remind me to pick up my dry cleaning this afternoon.", Reminder),
    ("Remind me to check the oven in 30 minutes.", Reminder),
    ("Remind me to schedule a team meeting for next Tuesday.", Reminder),
    ("Remind me to fill up the car with gas tomorrow.", Reminder),
    ("Remind me to pay the electric bill by the end of the week.", Reminder),
    ("Remind me to update my resume this weekend.", Reminder),
    ("Remind me to check in for my flight 24 hours before departure.", Reminder),
    ("Remind me to bring my umbrella if it's going to rain tomorrow.", Reminder),
    ("Don't let me forget to send the invoice on Friday.", Reminder),
    ("Set a reminder for my dentist appointment at 10am.", Reminder),
    ("In two hours tell me to take the laundry out.", Reminder),
    ("What's your favorite color?", Other),
    ("Can you send me the report?", Other),
    ("Buy tickets for the concert", Other),
    ("About how many atoms are there in the universe?", Other),
    ("Let's play a game.", Other),
    ("Can you turn on the TV?", Other),
    ("What's the weather like today?", Other),
    ("Let's order pizza for dinner.", Other),
    ("How many planets are there in our solar system?", Other),
    ("Can you find a good recipe for spaghetti bolognese?", Other),
    ("Who won the basketball game last night?", Other),
    ("Can you tell me a joke?", Other),
    ("What's the capital of Australia?", Other),
    ("What time is it?", Other),
    ("Who won the Oscar for Best Picture last year?", Other),
    ("Can you recommend a good book?", Other),
    ("What's the score of the baseball game?", Other),
    ("Can you find the fastest route to the airport?", Other),
    ("Who is the president of the United States?", Other),
    ("What are the ingredients in a Caesar salad?", Other),
    ("How do you make a margarita?", Other),
    ("In a short answer, tell me how to write pi/2 as an infinite sum.", Other),
    ("Explain how a binary search works.", Other),
    ("Write a haiku about autumn leaves.", Other),
    ("Summarize the plot of Hamlet in two sentences.", Other),
    ("Play Spirit in the Sky.", Media),
    ("I want to listen to Jay-Z", Media),
    ("Can you find a video explaining how quantum computers work?", Media),
    ("Play the phantom of the opera.", Media),
    ("play a song from the guardians of the galaxy soundtrack.", Media),
    ("can you find a video about the mathematics of neural networks?", Media),
    ("Can you play my favorite song?", Media),
    ("Put on some relaxing piano music.", Media),
    ("Play the latest Taylor Swift album.", Media),
    ("Queue up some lofi hip hop beats.", Media),
    ("Play a video of the best goals this season.", Media),
    ("Let's hear Bohemian Rhapsody by Queen.", Media),
];

/// Seed examples as owned training data
pub fn seed_examples() -> Vec<TrainingExample> {
    SEED_EXAMPLES
        .iter()
        .map(|&(text, label)| TrainingExample::new(text, label))
        .collect()
}
