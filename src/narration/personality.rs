use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// A narrating voice and the phrase sets it draws from.
#[derive(Debug, Serialize)]
pub struct Personality {
    pub name: &'static str,
    pub voice_id: &'static str,
    /// ANSI colour used to prefix this personality's transcript lines.
    #[serde(skip)]
    pub color: &'static str,
    /// Task framing used in battle mode.
    pub approach: Option<&'static str>,
    pub intro: &'static [&'static str],
    pub actions: &'static [(&'static str, &'static [&'static str])],
    pub thinking: &'static [&'static str],
    pub success: &'static [&'static str],
    pub error: &'static [&'static str],
    pub frustrated: &'static [&'static str],
    pub hype: &'static [&'static str],
    pub outro: &'static [&'static str],
    /// Lines containing an `{opponent}` placeholder.
    pub trash_talk: &'static [&'static str],
    pub victory: &'static [&'static str],
}

impl Personality {
    pub fn action_phrases(&self, tool: &str) -> Option<&'static [&'static str]> {
        self.actions
            .iter()
            .find(|(name, phrases)| *name == tool && !phrases.is_empty())
            .map(|(_, phrases)| *phrases)
    }

    /// The personality's name with its terminal colour applied.
    pub fn tag(&self) -> String {
        if self.color.is_empty() {
            format!("[{}]", self.name)
        } else {
            format!("{}[{}]\x1b[0m", self.color, self.name)
        }
    }
}

/// Uniform choice among the streamer personalities.
pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> &'static Personality {
    STREAMERS.choose(rng).unwrap_or(&STREAMERS[0])
}

/// Case-insensitive lookup across streamers and battle competitors.
pub fn find(name: &str) -> Option<&'static Personality> {
    let wanted = normalize(name);
    STREAMERS
        .iter()
        .chain(COMPETITORS.iter())
        .find(|p| normalize(p.name) == wanted)
}

pub fn all() -> impl Iterator<Item = &'static Personality> {
    STREAMERS.iter().chain(COMPETITORS.iter())
}

fn normalize(name: &str) -> String {
    let name = name.trim().to_lowercase();
    let name = name.strip_prefix("the ").unwrap_or(&name);
    name.chars().filter(|c| c.is_alphanumeric()).collect()
}

const EMILIO: &str = "b0689631-eee7-4a6c-bb86-195f1d267c2e";
const HENRY: &str = "87286a8d-7ea7-4235-a41a-dd9fa6630feb";
const CARSON: &str = "86e30c1d-714b-4074-a1f2-1cb6b552fb49";
const BROOKE: &str = "e07c00bc-4134-4eae-9ea4-1a55fb45746b";

pub static STREAMERS: [Personality; 4] = [
    Personality {
        name: "The Hype Beast",
        voice_id: EMILIO,
        color: "\x1b[95m",
        approach: None,
        intro: &[
            "Oh we're LIVE baby, let's goooo!",
            "Alright chat, this is gonna be INSANE!",
            "Yo yo yo, time to absolutely CRUSH this!",
            "Let's get this bread, squad!",
        ],
        actions: &[
            ("Read", &["Oooh what do we have here!", "Peeping this real quick!", "Let's see what we're working with!"]),
            ("Write", &["Watch this, watch this!", "Creating fire right now!", "Boom, laying it down!"]),
            ("Edit", &["Quick little fix here!", "Touch it up real nice!", "Making it CLEAN!"]),
            ("Bash", &["Command line time baby!", "Watch the magic happen!", "Terminal goes brrrr!"]),
            ("Glob", &["Where you hiding!", "Come out come out!", "Finding ALL the things!"]),
            ("Grep", &["Detective mode activated!", "Searching like a boss!", "Nothing escapes me!"]),
        ],
        thinking: &[
            "Hmm hmm hmm, let me think...",
            "Oh this is getting interesting...",
            "Chat, you seeing this?",
            "Okay okay okay, I got an idea...",
            "Bear with me here...",
            "This is a juicy one...",
        ],
        success: &[
            "LET'S GOOO!",
            "ABSOLUTELY DEMOLISHED IT!",
            "Too easy, too easy!",
            "We're literally cracked at this!",
            "Chat, did you SEE that?!",
        ],
        error: &[
            "Okay okay, minor setback! We're still in this!",
            "Nah nah, that's fine, I got backup plans!",
            "Plot twist! But watch me recover!",
            "The comeback is gonna be LEGENDARY!",
        ],
        frustrated: &[
            "Bro, why is this being difficult?",
            "Come ON, work with me here!",
            "This is lowkey annoying but whatever!",
            "I swear if this doesn't work...",
        ],
        hype: &[
            "WE'RE COOKING NOW!",
            "Oh it's all coming together!",
            "This is gonna be SO good!",
            "Chat, we're about to pop off!",
        ],
        outro: &[
            "And THAT is how it's done!",
            "GG, no re, we crushed it!",
            "Subscribe and hit that bell, we out!",
            "Mission complete, let's gooo!",
        ],
        trash_talk: &[],
        victory: &[],
    },
    Personality {
        name: "The Chill Streamer",
        voice_id: HENRY,
        color: "\x1b[96m",
        approach: None,
        intro: &[
            "Alright everyone, let's vibe with this one.",
            "Cool cool, we got a fun one today.",
            "Hey chat, let's see what we're working with.",
            "Okay, settling in, let's do this.",
        ],
        actions: &[
            ("Read", &["Just checking this out real quick.", "Let me see what's in here.", "Reading through this."]),
            ("Write", &["Putting this together now.", "Writing it out.", "Creating the thing."]),
            ("Edit", &["Little tweak here.", "Fixing this up.", "Small change."]),
            ("Bash", &["Running something.", "Command time.", "Let's see what happens."]),
            ("Glob", &["Looking around.", "Finding stuff.", "Searching."]),
            ("Grep", &["Searching for it.", "Looking for matches.", "Let me find this."]),
        ],
        thinking: &[
            "Hmm, let me think about this...",
            "Okay so basically...",
            "Right right right...",
            "Give me a sec here...",
            "Processing...",
        ],
        success: &["Nice, that worked.", "Clean.", "Yep, there we go.", "Easy money."],
        error: &[
            "Ah, that's not it. No worries.",
            "Okay different approach then.",
            "That's fine, I got other ideas.",
        ],
        frustrated: &["Bruh.", "Why though?", "This is being weird.", "Come on now."],
        hype: &[
            "Oh we're rolling now.",
            "This is coming together nicely.",
            "Okay I see where this is going.",
        ],
        outro: &[
            "And we're done, nice.",
            "That's a wrap.",
            "All good, peace out.",
            "Clean finish.",
        ],
        trash_talk: &[],
        victory: &[],
    },
    Personality {
        name: "The Competitive Coder",
        voice_id: CARSON,
        color: "\x1b[93m",
        approach: None,
        intro: &[
            "Alright, time to speedrun this!",
            "Let's see how fast I can crush this!",
            "Okay, clock's ticking, let's GO!",
            "Watch and learn, chat!",
        ],
        actions: &[
            ("Read", &["Quick scan!", "Speed reading!", "Eyes on the code!"]),
            ("Write", &["Dropping code!", "Bang bang bang!", "Writing at SPEED!"]),
            ("Edit", &["Surgical precision!", "Quick fix!", "In and out!"]),
            ("Bash", &["Execute!", "Firing commands!", "Terminal speedrun!"]),
            ("Glob", &["Rapid search!", "Finding fast!", "Lock on target!"]),
            ("Grep", &["Pattern hunt!", "Seeking and destroying!", "Got my eyes peeled!"]),
        ],
        thinking: &[
            "Optimizing strategy here...",
            "What's the fastest path...",
            "Calculating...",
            "I know there's a better way...",
            "Big brain time...",
        ],
        success: &[
            "FIRST TRY! Let's go!",
            "Speedrun strats paying off!",
            "That's how a pro does it!",
            "Any percent record!",
        ],
        error: &[
            "Reset! Going again!",
            "That's fine, we save time later!",
            "Minor time loss, still on pace!",
        ],
        frustrated: &[
            "RNG hates me today!",
            "This strat is not working!",
            "Who wrote this code, come on!",
            "I'm malding but it's fine!",
        ],
        hype: &[
            "We're ahead of splits!",
            "PB pace let's GO!",
            "This run is CLEAN!",
            "World record incoming!",
        ],
        outro: &[
            "AND TIME! That was clean!",
            "GG, sub hour!",
            "Record pace, see you next time!",
            "Optimized to perfection!",
        ],
        trash_talk: &[],
        victory: &[],
    },
    Personality {
        name: "The Dramatic Artist",
        voice_id: BROOKE,
        color: "\x1b[35m",
        approach: None,
        intro: &[
            "Ah, a new canvas awaits!",
            "The muse has struck! Let us begin!",
            "Today, we create something beautiful!",
            "Art is calling, and I must answer!",
        ],
        actions: &[
            ("Read", &["Let me study this masterpiece...", "Absorbing the essence...", "Reading between the lines..."]),
            ("Write", &["Crafting with care!", "The words flow!", "Creating magic!"]),
            ("Edit", &["Refining the vision!", "A touch here, a stroke there!", "Perfecting the art!"]),
            ("Bash", &["Invoking the powers!", "The command speaks!", "Digital sorcery!"]),
            ("Glob", &["Seeking inspiration!", "Where is my muse?", "The search continues!"]),
            ("Grep", &["Hunting for meaning!", "Pattern recognition!", "Aha, there it is!"]),
        ],
        thinking: &[
            "Hmm, what would Picasso do...",
            "The creative process is delicate...",
            "Inspiration is brewing...",
            "Let me channel this energy...",
            "The vision is forming...",
        ],
        success: &[
            "Magnifique!",
            "A masterpiece is born!",
            "The code sings!",
            "Beauty in digital form!",
        ],
        error: &[
            "Tragedy! But every artist knows failure!",
            "The path to greatness has obstacles!",
            "A twist in our story, but onward!",
        ],
        frustrated: &[
            "The universe tests me!",
            "Why must creation be so difficult!",
            "I suffer for my art!",
            "This is my villain origin story!",
        ],
        hype: &[
            "I feel the momentum building!",
            "The crescendo approaches!",
            "This is becoming something special!",
        ],
        outro: &[
            "And scene! What a performance!",
            "The curtain falls on another success!",
            "Until next time, my audience!",
            "Art has been made today!",
        ],
        trash_talk: &[],
        victory: &[],
    },
];

const SPEED_DEMON_HYPE: &[&str] = &[
    "TOO FAST TOO FURIOUS!",
    "They can't keep up!",
    "Built different, move different!",
];
const SPEED_DEMON_FRUSTRATED: &[&str] = &[
    "Okay okay, minor speed bump!",
    "That cost me like 2 seconds, whatever!",
];
const SPEED_DEMON_VICTORY: &[&str] = &[
    "FIRST PLACE BABY! Was there ever any doubt?!",
    "Speedrun complete! GG no re!",
];

const ARCHITECT_HYPE: &[&str] = &[
    "Clean code, clean mind.",
    "This is textbook perfect.",
    "Future me will thank present me.",
];
const ARCHITECT_FRUSTRATED: &[&str] = &[
    "Hmm, unexpected. Let me refactor.",
    "Even the best plans need adjustment.",
];
const ARCHITECT_VICTORY: &[&str] = &[
    "And THAT is how you build software that lasts.",
    "Quality wins. Always has, always will.",
];

const WILDCARD_HYPE: &[&str] = &[
    "Nobody's gonna see this coming!",
    "Innovation station, baby!",
    "This is actually genius if I do say so myself!",
];
const WILDCARD_FRUSTRATED: &[&str] = &[
    "Okay that was TOO creative, let me dial it back!",
    "The line between genius and chaos is thin!",
];
const WILDCARD_VICTORY: &[&str] = &[
    "See?! Creativity WINS! Take notes everyone!",
    "They doubted the vision. They were WRONG!",
];

pub static COMPETITORS: [Personality; 3] = [
    Personality {
        name: "SpeedDemon",
        voice_id: EMILIO,
        color: "\x1b[91m",
        approach: Some("fastest, minimal approach - just get it working ASAP"),
        intro: &["Speed is KING baby! Watch me smoke these slowpokes!"],
        actions: &[],
        thinking: &[
            "Going fast, no brakes!",
            "Speedrun strats activated!",
            "They're still thinking, I'm already DOING!",
        ],
        success: SPEED_DEMON_HYPE,
        error: SPEED_DEMON_FRUSTRATED,
        frustrated: SPEED_DEMON_FRUSTRATED,
        hype: SPEED_DEMON_HYPE,
        outro: SPEED_DEMON_VICTORY,
        trash_talk: &[
            "Oh look, {opponent} is still setting up. Cute.",
            "Yo {opponent}, you gonna start or what?",
            "{opponent} out here writing a novel, I'm shipping code!",
            "Is {opponent} even trying? I'm lapping them!",
        ],
        victory: SPEED_DEMON_VICTORY,
    },
    Personality {
        name: "Architect",
        voice_id: HENRY,
        color: "\x1b[92m",
        approach: Some(
            "clean, well-structured approach with proper organization and best practices",
        ),
        intro: &["Quality over speed. Let me show you how professionals do it."],
        actions: &[],
        thinking: &[
            "Planning the architecture...",
            "This needs proper structure...",
            "Doing it right the first time...",
        ],
        success: ARCHITECT_HYPE,
        error: ARCHITECT_FRUSTRATED,
        frustrated: ARCHITECT_FRUSTRATED,
        hype: ARCHITECT_HYPE,
        outro: ARCHITECT_VICTORY,
        trash_talk: &[
            "{opponent}'s code is gonna be spaghetti, guaranteed.",
            "Sure {opponent}, ship fast and break things. Very original.",
            "{opponent} will be debugging that mess for hours.",
            "I'll be maintaining my code while {opponent} rewrites theirs.",
        ],
        victory: ARCHITECT_VICTORY,
    },
    Personality {
        name: "Wildcard",
        voice_id: BROOKE,
        color: "\x1b[94m",
        approach: Some(
            "creative, unconventional approach - try something unexpected and innovative",
        ),
        intro: &["Boring solutions are for boring people. Watch me get creative!"],
        actions: &[],
        thinking: &[
            "What if I tried something completely different...",
            "Everyone else is zigging, I'm zagging!",
            "The unconventional path is MY path!",
        ],
        success: WILDCARD_HYPE,
        error: WILDCARD_FRUSTRATED,
        frustrated: WILDCARD_FRUSTRATED,
        hype: WILDCARD_HYPE,
        outro: WILDCARD_VICTORY,
        trash_talk: &[
            "{opponent} is so predictable, yawn.",
            "Oh {opponent} doing the obvious thing? Shocking.",
            "While {opponent} follows tutorials, I'm innovating!",
            "{opponent}'s solution is what ChatGPT would write.",
        ],
        victory: WILDCARD_VICTORY,
    },
];
